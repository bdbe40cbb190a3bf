//! services/api/src/web/assessment.rs
//!
//! Knowledge assessments: question delivery, server-side grading and the
//! post-assessment eligibility gate.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::domain::{Assessment, AssessmentKind, AssessmentQuestion};
use prog_helper_core::eligibility::{check_post_assessment_eligibility, post_assessment_message};
use prog_helper_core::ports::PortError;

#[derive(Deserialize, IntoParams)]
pub struct QuestionFilter {
    pub language: Option<String>,
    pub difficulty: Option<String>,
}

/// A question as served to the client. The correct answer and its explanation
/// never leave the server before grading.
#[derive(Serialize, ToSchema)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question: String,
    pub kind: String,
    pub options: Vec<String>,
    pub category: String,
    pub difficulty: String,
    pub language: Option<String>,
}

impl From<AssessmentQuestion> for QuestionResponse {
    fn from(q: AssessmentQuestion) -> Self {
        Self {
            id: q.id,
            question: q.question,
            kind: q.kind,
            options: q.options,
            category: q.category,
            difficulty: q.difficulty,
            language: q.language,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitAssessmentRequest {
    /// Map of question id to the chosen answer.
    pub answers: HashMap<Uuid, String>,
}

#[derive(Serialize, ToSchema)]
pub struct AssessmentResponse {
    pub id: Uuid,
    pub kind: String,
    /// Percentage score, 0-100.
    pub score: f64,
    pub total_questions: i64,
    pub completed_at: DateTime<Utc>,
}

impl From<Assessment> for AssessmentResponse {
    fn from(a: Assessment) -> Self {
        Self {
            id: a.id,
            kind: a.kind.as_str().to_string(),
            score: a.score,
            total_questions: a.total_questions,
            completed_at: a.completed_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EligibilityResponse {
    pub is_eligible: bool,
    pub minutes_since_registration: i64,
    pub min_minutes_required: i64,
    pub progress_percentage: u8,
    pub message: String,
}

fn parse_kind(raw: &str) -> Result<AssessmentKind, ApiError> {
    match raw {
        "pre" => Ok(AssessmentKind::Pre),
        "post" => Ok(AssessmentKind::Post),
        other => {
            Err(PortError::Invalid(format!("Unknown assessment kind '{other}'")).into())
        }
    }
}

/// Questions from the assessment bank, optionally filtered.
#[utoipa::path(
    get,
    path = "/assessments/questions",
    params(QuestionFilter),
    responses(
        (status = 200, description = "Question bank", body = [QuestionResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_questions_handler(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let questions = state
        .db
        .list_assessment_questions(filter.language.as_deref(), filter.difficulty.as_deref())
        .await?;
    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

/// Submit answers for grading. Grading happens entirely server-side against
/// the stored answer key; the post kind additionally requires eligibility.
#[utoipa::path(
    post,
    path = "/assessments/{kind}/submit",
    params(("kind" = String, Path, description = "Assessment kind, 'pre' or 'post'")),
    request_body = SubmitAssessmentRequest,
    responses(
        (status = 200, description = "Graded attempt", body = AssessmentResponse),
        (status = 400, description = "Unknown kind or empty submission"),
        (status = 401, description = "Not authenticated"),
        (status = 412, description = "Post-assessment not yet unlocked")
    )
)]
pub async fn submit_assessment_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(kind): Path<String>,
    Json(request): Json<SubmitAssessmentRequest>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    if request.answers.is_empty() {
        return Err(PortError::Invalid("No answers submitted".to_string()).into());
    }

    if kind == AssessmentKind::Post {
        let eligibility = check_post_assessment_eligibility(user.created_at, Utc::now());
        if !eligibility.is_eligible {
            return Err(
                PortError::PreconditionFailed(post_assessment_message(&eligibility)).into(),
            );
        }
    }

    let key: HashMap<Uuid, String> = state
        .db
        .list_assessment_questions(None, None)
        .await?
        .into_iter()
        .map(|q| (q.id, q.correct_answer))
        .collect();

    let total = request.answers.len() as i64;
    let mut correct = 0i64;
    for (question_id, answer) in &request.answers {
        match key.get(question_id) {
            Some(expected) if expected == answer => correct += 1,
            Some(_) => {}
            None => {
                return Err(PortError::Invalid(format!(
                    "Unknown question id {question_id}"
                ))
                .into())
            }
        }
    }
    let score = (correct as f64 / total as f64) * 100.0;

    let answers_json = serde_json::to_string(&request.answers)
        .map_err(|e| PortError::Unexpected(format!("Failed to encode answers: {e}")))?;

    let assessment = state
        .db
        .save_assessment(&user.id, kind, score, total, &answers_json)
        .await?;
    Ok(Json(assessment.into()))
}

/// The caller's most recent attempt of one kind, if any.
#[utoipa::path(
    get,
    path = "/assessments/{kind}/latest",
    params(("kind" = String, Path, description = "Assessment kind, 'pre' or 'post'")),
    responses(
        (status = 200, description = "Latest attempt", body = AssessmentResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No attempt of this kind yet")
    )
)]
pub async fn latest_assessment_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(kind): Path<String>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let assessment = state
        .db
        .latest_assessment(&user.id, kind)
        .await?
        .ok_or_else(|| PortError::NotFound("No assessment attempt yet".to_string()))?;
    Ok(Json(assessment.into()))
}

/// Whether the post-assessment has unlocked for the caller.
#[utoipa::path(
    get,
    path = "/assessments/eligibility",
    responses(
        (status = 200, description = "Eligibility state", body = EligibilityResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn eligibility_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<EligibilityResponse> {
    let eligibility = check_post_assessment_eligibility(user.created_at, Utc::now());
    let message = post_assessment_message(&eligibility);
    Json(EligibilityResponse {
        is_eligible: eligibility.is_eligible,
        minutes_since_registration: eligibility.minutes_since_registration,
        min_minutes_required: eligibility.min_minutes_required,
        progress_percentage: eligibility.progress_percentage,
        message,
    })
}
