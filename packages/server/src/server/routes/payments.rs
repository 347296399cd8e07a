//! Payment routes: checkout initiation and the member-only wall.

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::domains::identity::User;
use crate::domains::mugshots::Mugshot;
use crate::domains::payments::{initiate_checkout, CheckoutStarted};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

use super::{api_error, internal_error, ApiError};

/// Start a lifetime-access checkout. Gated on login + profile; the gate
/// has already run by the time this handler executes.
pub async fn start_checkout_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<CheckoutStarted>, ApiError> {
    let Some(Extension(auth)) = user else {
        return Err(api_error(StatusCode::UNAUTHORIZED, "not signed in"));
    };
    let user = User {
        id: auth.user_id,
        email: auth.email,
        is_admin: auth.is_admin,
    };

    let redirect_url = format!(
        "{}/wall",
        state.config.public_base_url.trim_end_matches('/')
    );

    let started = initiate_checkout(
        &user,
        state.gateway.as_ref(),
        state.payments.as_ref(),
        state.config.lifetime_price_cents,
        &state.config.currency,
        &redirect_url,
    )
    .await
    .map_err(internal_error)?;

    Ok(Json(started))
}

#[derive(Debug, Serialize)]
pub struct WallResponse {
    pub members: Vec<Mugshot>,
}

/// The member-only wall: the feature behind the full gate
/// (login + profile + payment).
pub async fn wall_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<WallResponse>, ApiError> {
    let members = state.mugshots.list_visible().await.map_err(internal_error)?;
    Ok(Json(WallResponse { members }))
}
