//! services/api/src/web/profile.rs
//!
//! The caller's own profile and per-language progress.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::domain::{LanguageProgress, ProfileUpdate, User};
use prog_helper_core::ports::PortError;

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub role: String,
    pub is_blocked: bool,
    pub experience_level: Option<String>,
    pub focus_areas: Vec<String>,
    pub preferred_language: Option<String>,
    pub onboarding_completed: bool,
    pub tour_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            role: u.role.as_str().to_string(),
            is_blocked: u.is_blocked,
            experience_level: u.experience_level,
            focus_areas: u.focus_areas,
            preferred_language: u.preferred_language,
            onboarding_completed: u.onboarding_completed,
            tour_completed: u.tour_completed,
            created_at: u.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub experience_level: Option<String>,
    pub focus_areas: Option<Vec<String>>,
    pub preferred_language: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LanguageProgressResponse {
    pub language: String,
    pub questions_asked: i64,
    pub tasks_completed: i64,
    pub last_used_at: DateTime<Utc>,
}

impl From<LanguageProgress> for LanguageProgressResponse {
    fn from(p: LanguageProgress) -> Self {
        Self {
            language: p.language,
            questions_asked: p.questions_asked,
            tasks_completed: p.tasks_completed,
            last_used_at: p.last_used_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct TrackLanguagesRequest {
    pub languages: Vec<String>,
}

/// The authenticated caller's profile.
#[utoipa::path(
    get,
    path = "/profile/me",
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<UserResponse> {
    Json(user.into())
}

/// Update the caller's profile. Absent fields are left untouched.
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid field value"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(level) = &request.experience_level {
        if level.trim().is_empty() {
            return Err(PortError::Invalid("Experience level cannot be empty".to_string()).into());
        }
    }
    let updated = state
        .db
        .update_profile(
            &user.id,
            ProfileUpdate {
                experience_level: request.experience_level,
                focus_areas: request.focus_areas,
                preferred_language: request.preferred_language,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

/// Per-language progress rows for the caller.
#[utoipa::path(
    get,
    path = "/profile/languages",
    responses(
        (status = 200, description = "Language progress", body = [LanguageProgressResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_languages_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<LanguageProgressResponse>>, ApiError> {
    let progress = state.db.list_language_progress(&user.id).await?;
    Ok(Json(progress.into_iter().map(Into::into).collect()))
}

/// Start tracking the given languages. Existing rows keep their counters;
/// repeat calls never double-count.
#[utoipa::path(
    put,
    path = "/profile/languages",
    request_body = TrackLanguagesRequest,
    responses(
        (status = 200, description = "Language progress after tracking", body = [LanguageProgressResponse]),
        (status = 400, description = "Empty language list"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn track_languages_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<TrackLanguagesRequest>,
) -> Result<Json<Vec<LanguageProgressResponse>>, ApiError> {
    let languages: Vec<String> = request
        .languages
        .iter()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();
    if languages.is_empty() {
        return Err(PortError::Invalid("No languages given".to_string()).into());
    }
    state.db.ensure_language_rows(&user.id, &languages).await?;
    let progress = state.db.list_language_progress(&user.id).await?;
    Ok(Json(progress.into_iter().map(Into::into).collect()))
}
