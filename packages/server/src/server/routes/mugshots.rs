//! Mugshot routes: public listing plus owner-scoped mutations.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domains::mugshots::{CreateMugshot, Mugshot, UpdateMugshot};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

use super::{api_error, internal_error, ApiError};

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub mugshots: Vec<Mugshot>,
}

/// Public listing of all visible mugshots, served through the TTL cache.
pub async fn list_mugshots_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<ListingResponse>, ApiError> {
    if let Some(mugshots) = state.listing_cache.get().await {
        return Ok(Json(ListingResponse { mugshots }));
    }

    let mugshots = state.mugshots.list_visible().await.map_err(internal_error)?;
    state.listing_cache.put(mugshots.clone()).await;
    Ok(Json(ListingResponse { mugshots }))
}

fn require_auth(user: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    match user {
        Some(Extension(user)) => Ok(user),
        None => Err(api_error(StatusCode::UNAUTHORIZED, "not signed in")),
    }
}

pub async fn create_mugshot_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<CreateMugshot>,
) -> Result<(StatusCode, Json<Mugshot>), ApiError> {
    let user = require_auth(user)?;
    payload
        .validate()
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let exists = state
        .mugshots
        .exists_for_user(user.user_id)
        .await
        .map_err(internal_error)?;
    if exists {
        return Err(api_error(
            StatusCode::CONFLICT,
            "you already have a mugshot",
        ));
    }

    let mugshot = state
        .mugshots
        .insert(user.user_id, &payload)
        .await
        .map_err(internal_error)?;
    state.listing_cache.invalidate().await;

    tracing::info!(user_id = %user.user_id, mugshot_id = %mugshot.id, "Mugshot created");
    Ok((StatusCode::CREATED, Json(mugshot)))
}

pub async fn my_mugshot_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
) -> Result<Json<Mugshot>, ApiError> {
    let user = require_auth(user)?;
    let mugshot = state
        .mugshots
        .find_by_user_id(user.user_id)
        .await
        .map_err(internal_error)?;
    mugshot
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "no mugshot yet"))
}

pub async fn update_mugshot_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Json(payload): Json<UpdateMugshot>,
) -> Result<Json<Mugshot>, ApiError> {
    let user = require_auth(user)?;
    payload
        .validate()
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    // Ownership is the lookup key: a user can only ever update their own row.
    let updated = state
        .mugshots
        .update_by_owner(user.user_id, &payload)
        .await
        .map_err(internal_error)?;
    let Some(mugshot) = updated else {
        return Err(api_error(StatusCode::NOT_FOUND, "no mugshot yet"));
    };
    state.listing_cache.invalidate().await;
    Ok(Json(mugshot))
}

/// Administrative deletion; not reachable through the normal flow.
pub async fn delete_mugshot_handler(
    Extension(state): Extension<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user = require_auth(user)?;
    if !user.is_admin {
        return Err(api_error(StatusCode::FORBIDDEN, "admin access required"));
    }

    let deleted = state.mugshots.delete(id).await.map_err(internal_error)?;
    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "mugshot not found"));
    }
    state.listing_cache.invalidate().await;

    tracing::info!(mugshot_id = %id, admin = %user.email, "Mugshot deleted");
    Ok(StatusCode::NO_CONTENT)
}
