use axum::http::HeaderMap;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::server::app::AppState;

/// Authenticated user information from session
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// Extract the bearer token from an Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Middleware to extract the session and populate the auth user
///
/// This middleware:
/// 1. Extracts the session token from the Authorization header
/// 2. Resolves the user through the identity provider
/// 3. Stores AuthUser in request extensions
///
/// Note: This middleware does NOT block requests - it only extracts auth
/// info. Denials happen in the gate middleware, which re-resolves the
/// session fail-closed.
pub async fn session_auth_middleware(
    state: AppState,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match state.identity.current_user(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthUser {
                    user_id: user.id,
                    email: user.email,
                    is_admin: user.is_admin,
                });
            }
            Ok(None) => {}
            Err(e) => {
                // The gate decides what an unresolvable session means.
                tracing::warn!(error = %e, "Session lookup failed");
            }
        }
    }

    next.run(request).await
}
