//! services/api/src/web/admin.rs
//!
//! Moderation endpoints, reachable only through the admin middleware tier.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::info;

use crate::error::ApiError;
use crate::web::profile::UserResponse;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::ports::PortError;

/// All user rows, for the moderation panel.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Block a user. Admins cannot block themselves.
#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/block",
    params(("user_id" = String, Path, description = "The user to block")),
    responses(
        (status = 204, description = "User blocked"),
        (status = 400, description = "Attempt to block yourself"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn block_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == admin.id {
        return Err(PortError::Invalid("You cannot block yourself".to_string()).into());
    }
    state.db.set_user_blocked(&user_id, true).await?;
    info!(admin_id = %admin.id, user_id = %user_id, "User blocked");
    Ok(StatusCode::NO_CONTENT)
}

/// Lift a user's block.
#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/unblock",
    params(("user_id" = String, Path, description = "The user to unblock")),
    responses(
        (status = 204, description = "User unblocked"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn unblock_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.set_user_blocked(&user_id, false).await?;
    info!(admin_id = %admin.id, user_id = %user_id, "User unblocked");
    Ok(StatusCode::NO_CONTENT)
}
