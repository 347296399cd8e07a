//! Gated feature wrapper.
//!
//! Route-level middleware that resolves the access engine's verdict once
//! per request and either lets the protected handler run or returns a
//! blocking response. Every denial carries exactly one next action; a
//! login denial preserves the originally requested path so the client can
//! redirect back after sign-in.
//!
//! The verdict is a one-shot computation per request - there is no
//! polling. Clients that want to react to sign-in/sign-out use
//! `IdentityProvider::subscribe` and re-request.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domains::access::{AccessError, GateRequirements, Verdict};
use crate::server::app::AppState;
use crate::server::middleware::bearer_token;

/// Blocking response for a denied request.
#[derive(Debug, Serialize)]
pub struct DenialBody {
    pub verdict: Verdict,
    pub next_action: &'static str,
    pub action_url: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RetryBody {
    pub next_action: &'static str,
    pub message: &'static str,
}

/// Gate middleware: allow through or render the remediation response.
pub async fn gate_middleware(
    state: AppState,
    requirements: GateRequirements,
    request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers());
    let requested_path = request.uri().path().to_string();

    match state.engine.check(token.as_deref(), requirements).await {
        Ok(Verdict::Allow) => next.run(request).await,
        Ok(verdict) => denial_response(&state, verdict, &requested_path),
        Err(AccessError::Identity(e)) => {
            // Fail closed: an unverifiable session is treated as no
            // session, never as access.
            tracing::warn!(error = %e, path = %requested_path, "Identity check failed, requiring login");
            denial_response(&state, Verdict::RequireLogin, &requested_path)
        }
        Err(AccessError::Backend(e)) => {
            tracing::error!(error = %e, path = %requested_path, "Access check backend failure");
            retry_response()
        }
    }
}

fn denial_response(state: &AppState, verdict: Verdict, requested_path: &str) -> Response {
    let base = state.config.public_base_url.trim_end_matches('/');
    let (status, next_action, action_url, message) = match verdict {
        Verdict::RequireLogin => (
            StatusCode::UNAUTHORIZED,
            "login",
            format!(
                "{}/auth/session?redirect_to={}",
                base,
                urlencoding::encode(requested_path)
            ),
            "Sign in to continue",
        ),
        Verdict::RequireProfile => (
            StatusCode::FORBIDDEN,
            "create_profile",
            format!("{base}/mugshots"),
            "Create your mugshot to continue",
        ),
        Verdict::RequirePayment => (
            StatusCode::PAYMENT_REQUIRED,
            "checkout",
            format!("{base}/payments/checkout"),
            "Unlock lifetime access to continue",
        ),
        // Allow never reaches here.
        Verdict::Allow => unreachable!("allow verdict is not a denial"),
    };

    (
        status,
        Json(DenialBody {
            verdict,
            next_action,
            action_url,
            message,
        }),
    )
        .into_response()
}

fn retry_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(RetryBody {
            next_action: "retry",
            message: "Could not verify access, please retry",
        }),
    )
        .into_response()
}
