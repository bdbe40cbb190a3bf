//! crates/prog_helper_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Assessment, AssessmentKind, AssessmentQuestion, ChatSession, ChatTurn, GlobalStats, Identity,
    LanguageProgress, Message, MessageRole, ProfileUpdate, ProgrammingTask, Stats, TaskStatus,
    User, UserTaskProgress,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network)
/// and carries the full error taxonomy the web layer maps onto HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Fields required to append one message to the log.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: String,
    pub session_id: Option<Uuid>,
    pub role: MessageRole,
    pub content: String,
    pub question_type: Option<String>,
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Mirrors the provider identity into a local row on first sight.
    /// `admin` promotes (or confirms) the admin role for allow-listed emails.
    async fn get_or_create_user(&self, user_id: &str, admin: bool) -> PortResult<User>;
    async fn get_user(&self, user_id: &str) -> PortResult<User>;
    async fn list_users(&self) -> PortResult<Vec<User>>;
    async fn set_user_blocked(&self, user_id: &str, blocked: bool) -> PortResult<()>;
    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> PortResult<User>;
    async fn set_onboarding_completed(&self, user_id: &str) -> PortResult<()>;
    async fn set_tour_completed(&self, user_id: &str) -> PortResult<()>;

    // --- Chat Sessions ---
    async fn create_chat_session(&self, user_id: &str, title: &str) -> PortResult<ChatSession>;
    async fn get_chat_session(&self, user_id: &str, session_id: Uuid) -> PortResult<ChatSession>;
    async fn list_chat_sessions(&self, user_id: &str) -> PortResult<Vec<ChatSession>>;
    async fn touch_chat_session(&self, session_id: Uuid) -> PortResult<()>;
    async fn rename_chat_session(&self, session_id: Uuid, title: &str) -> PortResult<()>;
    async fn delete_chat_session(&self, user_id: &str, session_id: Uuid) -> PortResult<()>;

    // --- Message Log ---
    async fn append_message(&self, new: NewMessage) -> PortResult<Message>;
    /// Messages of one session in ascending timestamp order.
    async fn session_messages(&self, user_id: &str, session_id: Uuid) -> PortResult<Vec<Message>>;
    async fn count_session_messages(&self, session_id: Uuid) -> PortResult<i64>;
    /// Classification labels of the user's most recent classified messages,
    /// newest first.
    async fn recent_question_types(&self, user_id: &str, limit: i64) -> PortResult<Vec<String>>;

    // --- Stats / Counters ---
    async fn get_stats(&self, user_id: &str) -> PortResult<Option<Stats>>;
    /// Applies one observed question in a single atomic upsert: increments
    /// `questions_asked`, folds `response_time_secs` into the incremental mean
    /// and stores the freshly computed modal classification.
    async fn record_question(
        &self,
        user_id: &str,
        response_time_secs: f64,
        most_frequent_type: &str,
    ) -> PortResult<Stats>;
    async fn record_task_completion(&self, user_id: &str) -> PortResult<Stats>;
    async fn global_stats(&self) -> PortResult<GlobalStats>;

    // --- Language Progress ---
    /// Upserts the (user, language) row, adding the given deltas and touching
    /// `last_used_at`.
    async fn bump_language_progress(
        &self,
        user_id: &str,
        language: &str,
        questions: i64,
        tasks: i64,
    ) -> PortResult<()>;
    async fn list_language_progress(&self, user_id: &str) -> PortResult<Vec<LanguageProgress>>;
    /// Ensures one row per language exists for the user without double-counting
    /// anything on repeat calls.
    async fn ensure_language_rows(&self, user_id: &str, languages: &[String]) -> PortResult<()>;

    // --- Assessments ---
    async fn list_assessment_questions(
        &self,
        language: Option<&str>,
        difficulty: Option<&str>,
    ) -> PortResult<Vec<AssessmentQuestion>>;
    async fn save_assessment(
        &self,
        user_id: &str,
        kind: AssessmentKind,
        score: f64,
        total_questions: i64,
        answers_json: &str,
    ) -> PortResult<Assessment>;
    async fn latest_assessment(
        &self,
        user_id: &str,
        kind: AssessmentKind,
    ) -> PortResult<Option<Assessment>>;

    // --- Programming Tasks ---
    async fn list_tasks(
        &self,
        language: Option<&str>,
        difficulty: Option<&str>,
    ) -> PortResult<Vec<ProgrammingTask>>;
    async fn get_task(&self, task_id: Uuid) -> PortResult<ProgrammingTask>;
    async fn upsert_task_progress(
        &self,
        user_id: &str,
        task_id: Uuid,
        status: TaskStatus,
        solution: Option<&str>,
    ) -> PortResult<UserTaskProgress>;
    async fn get_task_progress(
        &self,
        user_id: &str,
        task_id: Uuid,
    ) -> PortResult<Option<UserTaskProgress>>;
    async fn list_task_progress(&self, user_id: &str) -> PortResult<Vec<UserTaskProgress>>;

    // --- Contact ---
    async fn save_contact_message(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generates the assistant reply for a new user message, given the system
    /// prompt and the capped conversation history.
    async fn generate_reply(
        &self,
        system_prompt: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Sorts a question into one of the eight fixed categories.
    async fn classify_question(&self, message: &str) -> PortResult<String>;
}

#[async_trait]
pub trait TitleService: Send + Sync {
    /// Produces a short (max 6 words) session title for a question.
    async fn generate_title(&self, message: &str) -> PortResult<String>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validates a session token with the external auth provider and returns
    /// the identity claim it carries.
    async fn verify_session(&self, token: &str) -> PortResult<Identity>;
}
