//! services/api/src/web/chat.rs
//!
//! The chat endpoints, including the message exchange that drives the
//! per-user counter reconciliation: classify, log, generate, log, then
//! fold the observed latency and classification into the derived stats.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::chat::{
    clean_title, fallback_title, validate_message, HISTORY_TURN_CAP, RECENT_CLASSIFICATION_WINDOW,
};
use prog_helper_core::domain::{ChatTurn, MessageRole, User};
use prog_helper_core::ports::{NewMessage, PortError, PortResult};
use prog_helper_core::prompts::{
    detect_language, normalize_category, system_prompt, DEFAULT_CATEGORY, GENERAL_LANGUAGE,
};
use prog_helper_core::stats::most_frequent_label;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub message: String,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub response: String,
    pub session_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub question_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// The Message Exchange
//=========================================================================================

/// Runs one full chat exchange for `user`. Extracted from the handler so the
/// flow can be exercised directly with scripted port implementations.
pub async fn send_message(
    state: &AppState,
    user: &User,
    request: SendMessageRequest,
) -> PortResult<SendMessageResponse> {
    // 1. Request budget, before any work.
    let decision = state.rate_limiter.check(
        &user.id,
        state.config.chat_rate_limit,
        state.config.chat_rate_window_ms,
    );
    if !decision.allowed {
        return Err(PortError::RateLimited {
            retry_after_secs: decision.retry_after_secs(Utc::now().timestamp_millis()),
        });
    }

    // 2. Validation, before any persistence.
    let message = validate_message(&request.message)?;

    if !user.onboarding_completed {
        return Err(PortError::PreconditionFailed(
            "Please complete onboarding before sending messages".to_string(),
        ));
    }

    // 3. Resolve the session, creating one lazily on the first message.
    let session = match request.session_id {
        Some(session_id) => state.db.get_chat_session(&user.id, session_id).await?,
        None => {
            state
                .db
                .create_chat_session(&user.id, &fallback_title(&message))
                .await?
        }
    };
    let messages_before = state.db.count_session_messages(session.id).await?;

    // 4. Conversation history, capped at the last 20 turns.
    let prior_messages = state.db.session_messages(&user.id, session.id).await?;
    let skip = prior_messages.len().saturating_sub(HISTORY_TURN_CAP);
    let history: Vec<ChatTurn> = prior_messages
        .iter()
        .skip(skip)
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content.clone(),
        })
        .collect();
    let prior_user_turns: Vec<String> = prior_messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.clone())
        .collect();

    // 5. Classify. Failures degrade to the default category instead of
    //    failing the exchange.
    let question_type = match state.classifier.classify_question(&message).await {
        Ok(raw) => normalize_category(&raw).to_string(),
        Err(e) => {
            warn!("Question classification failed: {:?}", e);
            DEFAULT_CATEGORY.to_string()
        }
    };

    // The modal classification counts the last N classified messages plus the
    // current one, so the labels are read before the current row lands.
    let recent_types = state
        .db
        .recent_question_types(&user.id, RECENT_CLASSIFICATION_WINDOW)
        .await?;

    state
        .db
        .append_message(NewMessage {
            user_id: user.id.clone(),
            session_id: Some(session.id),
            role: MessageRole::User,
            content: message.clone(),
            question_type: Some(question_type.clone()),
        })
        .await?;

    // 6. Generate the reply. No retries; a provider failure propagates.
    let started = Instant::now();
    let reply = state
        .completions
        .generate_reply(&system_prompt(&message, &prior_user_turns), &history, &message)
        .await?;
    let response_time_secs = started.elapsed().as_secs_f64();

    state
        .db
        .append_message(NewMessage {
            user_id: user.id.clone(),
            session_id: Some(session.id),
            role: MessageRole::Assistant,
            content: reply.clone(),
            question_type: None,
        })
        .await?;

    state.db.touch_chat_session(session.id).await?;

    // 7. After the first exchange, replace the placeholder title.
    //    Best-effort: a failure here never fails the exchange.
    if messages_before == 0 {
        match state.titles.generate_title(&message).await {
            Ok(generated) => {
                let title = clean_title(&generated, &message);
                if let Err(e) = state.db.rename_chat_session(session.id, &title).await {
                    warn!("Failed to store regenerated session title: {:?}", e);
                }
            }
            Err(e) => warn!("Session title generation failed: {:?}", e),
        }
    }

    // 8. Reconcile the derived counters.
    let most_frequent = most_frequent_label(&recent_types, &question_type);
    let stats = state
        .db
        .record_question(&user.id, response_time_secs, &most_frequent)
        .await?;
    info!(
        user_id = %user.id,
        questions_asked = stats.questions_asked,
        avg_response_time = stats.avg_response_time,
        "Recorded chat exchange"
    );

    let language = detect_language(&message);
    if language != GENERAL_LANGUAGE {
        state
            .db
            .bump_language_progress(&user.id, language, 1, 0)
            .await?;
    }

    Ok(SendMessageResponse {
        response: reply,
        session_id: session.id,
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Send a chat message and receive the generated reply.
#[utoipa::path(
    post,
    path = "/chat/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Reply generated", body = SendMessageResponse),
        (status = 400, description = "Invalid message"),
        (status = 401, description = "Not authenticated"),
        (status = 412, description = "Onboarding incomplete"),
        (status = 429, description = "Rate budget exceeded"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let response = send_message(&state, &user, request).await?;
    Ok(Json(response))
}

/// List the caller's chat sessions, most recently used first.
#[utoipa::path(
    get,
    path = "/chat/sessions",
    responses(
        (status = 200, description = "Sessions listed", body = [SessionResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = state.db.list_chat_sessions(&user.id).await?;
    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionResponse {
                id: s.id,
                title: s.title,
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect(),
    ))
}

/// Fetch the messages of one session in timestamp order.
#[utoipa::path(
    get,
    path = "/chat/sessions/{session_id}/messages",
    params(("session_id" = Uuid, Path, description = "The session to read")),
    responses(
        (status = 200, description = "Messages listed", body = [MessageResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_messages_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    // Ownership check first so a foreign session reads as not-found.
    state.db.get_chat_session(&user.id, session_id).await?;
    let messages = state.db.session_messages(&user.id, session_id).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageResponse {
                id: m.id,
                role: m.role.as_str().to_string(),
                content: m.content,
                question_type: m.question_type,
                created_at: m.created_at,
            })
            .collect(),
    ))
}

/// Delete one of the caller's sessions and its messages.
#[utoipa::path(
    delete,
    path = "/chat/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "The session to delete")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_chat_session(&user.id, session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
