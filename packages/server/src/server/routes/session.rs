//! Session routes: the thin surface over the identity provider adapter.
//!
//! `POST /auth/session` is the provider's sign-in callback: by the time it
//! is called the external provider has verified the principal, so the
//! handler's job is only to mint a session. The admin flag comes from the
//! configured admin email list.

use axum::extract::{Extension, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domains::identity::User;
use crate::server::app::AppState;
use crate::server::middleware::{bearer_token, AuthUser};

use super::{api_error, internal_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct SignInPayload {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(default)]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

pub async fn sign_in_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<SignInQuery>,
    Json(payload): Json<SignInPayload>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "a valid email is required",
        ));
    }

    let is_admin = state.config.admin_emails.contains(&email);
    // The principal id is stable per email: re-authenticating must keep
    // pointing at the same mugshot and payment records.
    let user = state
        .identity
        .resolve_principal(&email, is_admin)
        .await
        .map_err(internal_error)?;
    let token = state
        .identity
        .sign_in(user.clone())
        .await
        .map_err(internal_error)?;

    tracing::info!(user_id = %user.id, "Session created");

    Ok(Json(SessionResponse {
        token,
        user,
        // Echoed back so the client can finish the interrupted navigation.
        redirect_to: query.redirect_to,
    }))
}

pub async fn sign_out_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state.identity.sign_out(&token).await.map_err(internal_error)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(user: Option<Extension<AuthUser>>) -> Result<Json<AuthUserResponse>, ApiError> {
    let Some(Extension(user)) = user else {
        return Err(api_error(StatusCode::UNAUTHORIZED, "not signed in"));
    };
    Ok(Json(AuthUserResponse {
        user_id: user.user_id.to_string(),
        email: user.email,
        is_admin: user.is_admin,
    }))
}

#[derive(Debug, Serialize)]
pub struct AuthUserResponse {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}
