//! services/api/src/web/stats.rs
//!
//! Per-user counters and the public aggregate figures.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::domain::{GlobalStats, Stats};

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub questions_asked: i64,
    pub tasks_completed: i64,
    pub avg_response_time: f64,
    pub most_frequent_response_type: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatsResponse {
    fn from_stats(stats: Option<Stats>) -> Self {
        match stats {
            Some(s) => Self {
                questions_asked: s.questions_asked,
                tasks_completed: s.tasks_completed,
                avg_response_time: s.avg_response_time,
                most_frequent_response_type: s.most_frequent_response_type,
                updated_at: Some(s.updated_at),
            },
            // A user who has never asked a question reads as all zeroes.
            None => Self {
                questions_asked: 0,
                tasks_completed: 0,
                avg_response_time: 0.0,
                most_frequent_response_type: None,
                updated_at: None,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GlobalStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub total_questions: i64,
    pub total_solutions: i64,
}

impl From<GlobalStats> for GlobalStatsResponse {
    fn from(g: GlobalStats) -> Self {
        Self {
            total_users: g.total_users,
            active_users: g.active_users,
            total_questions: g.total_questions,
            total_solutions: g.total_solutions,
        }
    }
}

/// The caller's derived counters.
#[utoipa::path(
    get,
    path = "/stats/me",
    responses(
        (status = 200, description = "Counters for the caller", body = StatsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.db.get_stats(&user.id).await?;
    Ok(Json(StatsResponse::from_stats(stats)))
}

/// Public aggregate figures for the landing page. Store failures degrade to
/// zeroes rather than erroring the page.
#[utoipa::path(
    get,
    path = "/stats/global",
    responses(
        (status = 200, description = "Aggregate usage figures", body = GlobalStatsResponse)
    )
)]
pub async fn global_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Json<GlobalStatsResponse> {
    let stats = match state.db.global_stats().await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Failed to compute global stats, serving zeroes: {:?}", e);
            GlobalStats::default()
        }
    };
    Json(stats.into())
}
