//! services/api/src/web/tasks.rs
//!
//! The practice task catalog and per-user task progress. Completing a task
//! feeds the same counter reconciliation as the chat exchange.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::domain::{ProgrammingTask, TaskStatus, UserTaskProgress};

#[derive(Deserialize, IntoParams)]
pub struct TaskFilter {
    pub language: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub language: String,
    pub difficulty: String,
    pub category: String,
    pub starter_code: Option<String>,
    pub hints: Vec<String>,
}

impl From<ProgrammingTask> for TaskResponse {
    fn from(t: ProgrammingTask) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            language: t.language,
            difficulty: t.difficulty,
            category: t.category,
            starter_code: t.starter_code,
            hints: t.hints,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TaskProgressResponse {
    pub task_id: Uuid,
    pub status: String,
    pub solution: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<UserTaskProgress> for TaskProgressResponse {
    fn from(p: UserTaskProgress) -> Self {
        Self {
            task_id: p.task_id,
            status: p.status.as_str().to_string(),
            solution: p.solution,
            completed_at: p.completed_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteTaskRequest {
    pub solution: Option<String>,
}

/// The task catalog, optionally filtered by language and difficulty.
#[utoipa::path(
    get,
    path = "/tasks",
    params(TaskFilter),
    responses(
        (status = 200, description = "Task catalog", body = [TaskResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state
        .db
        .list_tasks(filter.language.as_deref(), filter.difficulty.as_deref())
        .await?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// One task by id.
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    params(("task_id" = Uuid, Path, description = "The task to fetch")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.db.get_task(task_id).await?;
    Ok(Json(task.into()))
}

/// The caller's progress rows across all tasks.
#[utoipa::path(
    get,
    path = "/tasks/progress",
    responses(
        (status = 200, description = "Progress rows", body = [TaskProgressResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<TaskProgressResponse>>, ApiError> {
    let progress = state.db.list_task_progress(&user.id).await?;
    Ok(Json(progress.into_iter().map(Into::into).collect()))
}

/// Mark a task as started for the caller.
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/start",
    params(("task_id" = Uuid, Path, description = "The task to start")),
    responses(
        (status = 200, description = "Progress row", body = TaskProgressResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn start_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskProgressResponse>, ApiError> {
    state.db.get_task(task_id).await?;

    // A task that is already completed stays completed.
    if let Some(existing) = state.db.get_task_progress(&user.id, task_id).await? {
        if existing.status == TaskStatus::Completed {
            return Ok(Json(existing.into()));
        }
    }

    let progress = state
        .db
        .upsert_task_progress(&user.id, task_id, TaskStatus::InProgress, None)
        .await?;
    Ok(Json(progress.into()))
}

/// Complete a task. The first completion increments the caller's
/// `tasks_completed` counter and the task language's progress row; repeats
/// only update the stored solution.
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/complete",
    params(("task_id" = Uuid, Path, description = "The task to complete")),
    request_body = CompleteTaskRequest,
    responses(
        (status = 200, description = "Progress row", body = TaskProgressResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn complete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<CompleteTaskRequest>,
) -> Result<Json<TaskProgressResponse>, ApiError> {
    let task = state.db.get_task(task_id).await?;

    let already_completed = state
        .db
        .get_task_progress(&user.id, task_id)
        .await?
        .map(|p| p.status == TaskStatus::Completed)
        .unwrap_or(false);

    let progress = state
        .db
        .upsert_task_progress(
            &user.id,
            task_id,
            TaskStatus::Completed,
            request.solution.as_deref(),
        )
        .await?;

    if !already_completed {
        let stats = state.db.record_task_completion(&user.id).await?;
        state
            .db
            .bump_language_progress(&user.id, &task.language, 0, 1)
            .await?;
        info!(
            user_id = %user.id,
            task_id = %task_id,
            tasks_completed = stats.tasks_completed,
            "Recorded task completion"
        );
    }

    Ok(Json(progress.into()))
}
