//! services/api/src/web/profile.rs
//!
//! The remote mirror of a user's data. Clients push their whole profile record
//! after local writes and pull it back on sign-in.

use crate::web::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use focuspoint_core::domain::ProfileRecord;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// GET /profile - Load the signed-in user's profile record
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The stored profile record"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No profile has been saved yet")
    )
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<ProfileRecord>, (StatusCode, String)> {
    let record = state.profiles.load_profile(user_id).await.map_err(|e| {
        error!("Failed to load profile: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load profile".to_string())
    })?;
    record
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No profile saved".to_string()))
}

/// PUT /profile - Replace the signed-in user's profile record
#[utoipa::path(
    put,
    path = "/profile",
    request_body(content_type = "application/json", description = "The full profile record."),
    responses(
        (status = 204, description = "Profile saved"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn put_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(record): Json<ProfileRecord>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .profiles
        .upsert_profile(user_id, &record)
        .await
        .map_err(|e| {
            error!("Failed to save profile: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save profile".to_string())
        })?;
    info!(%user_id, tasks = record.tasks.len(), "Profile saved");
    Ok(StatusCode::NO_CONTENT)
}
