//! services/api/src/web/onboarding.rs
//!
//! First-run onboarding: capture the profile, seed language tracking and
//! unlock the chat.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::profile::UserResponse;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::domain::ProfileUpdate;
use prog_helper_core::ports::PortError;

#[derive(Deserialize, ToSchema)]
pub struct CompleteOnboardingRequest {
    pub experience_level: String,
    pub focus_areas: Vec<String>,
    pub preferred_language: Option<String>,
}

/// Complete onboarding: store the profile and mark the user ready to chat.
#[utoipa::path(
    post,
    path = "/onboarding/complete",
    request_body = CompleteOnboardingRequest,
    responses(
        (status = 200, description = "Onboarding completed", body = UserResponse),
        (status = 400, description = "Missing experience level or focus areas"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn complete_onboarding_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CompleteOnboardingRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if request.experience_level.trim().is_empty() {
        return Err(PortError::Invalid("Experience level is required".to_string()).into());
    }
    let focus_areas: Vec<String> = request
        .focus_areas
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if focus_areas.is_empty() {
        return Err(PortError::Invalid("At least one focus area is required".to_string()).into());
    }

    state
        .db
        .update_profile(
            &user.id,
            ProfileUpdate {
                experience_level: Some(request.experience_level.trim().to_string()),
                focus_areas: Some(focus_areas),
                preferred_language: request.preferred_language.clone(),
            },
        )
        .await?;

    if let Some(language) = &request.preferred_language {
        let language = language.trim().to_lowercase();
        if !language.is_empty() {
            state
                .db
                .ensure_language_rows(&user.id, std::slice::from_ref(&language))
                .await?;
        }
    }

    state.db.set_onboarding_completed(&user.id).await?;
    let updated = state.db.get_user(&user.id).await?;
    Ok(Json(updated.into()))
}

/// Mark the guided tour as seen.
#[utoipa::path(
    post,
    path = "/onboarding/tour-complete",
    responses(
        (status = 204, description = "Tour marked complete"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn complete_tour_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.set_tour_completed(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
