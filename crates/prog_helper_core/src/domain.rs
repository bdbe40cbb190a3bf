//! crates/prog_helper_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Role assigned to a user. Admins get access to the moderation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// A user mirrored from the external identity provider on first sight.
/// The id is the provider's opaque identifier, never generated locally.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub role: Role,
    pub is_blocked: bool,
    pub experience_level: Option<String>,
    pub focus_areas: Vec<String>,
    pub preferred_language: Option<String>,
    pub onboarding_completed: bool,
    pub tour_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The identity claim returned by the external auth provider.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

/// A chat session owning an ordered run of messages. Created lazily on the
/// first message when the client does not supply one.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> MessageRole {
        match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

/// An append-only chat message. `question_type` caches the classification
/// label for user messages; ordering by `created_at` is the sole invariant.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub user_id: String,
    pub session_id: Option<Uuid>,
    pub role: MessageRole,
    pub content: String,
    pub question_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A (role, content) pair of prior conversation handed to the completion
/// provider as context.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Per-user denormalized counters. `avg_response_time` is the exact
/// incremental mean of all observed response latencies, in seconds.
#[derive(Debug, Clone)]
pub struct Stats {
    pub user_id: String,
    pub questions_asked: i64,
    pub tasks_completed: i64,
    pub avg_response_time: f64,
    pub most_frequent_response_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Per-(user, language) counters, upserted idempotently.
#[derive(Debug, Clone)]
pub struct LanguageProgress {
    pub user_id: String,
    pub language: String,
    pub questions_asked: i64,
    pub tasks_completed: i64,
    pub last_used_at: DateTime<Utc>,
}

/// Aggregate figures for the public landing dashboard.
#[derive(Debug, Clone, Default)]
pub struct GlobalStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_questions: i64,
    pub total_solutions: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentKind {
    Pre,
    Post,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Pre => "pre",
            AssessmentKind::Post => "post",
        }
    }

    pub fn parse(s: &str) -> AssessmentKind {
        match s {
            "post" => AssessmentKind::Post,
            _ => AssessmentKind::Pre,
        }
    }
}

/// A question from the knowledge-assessment bank.
#[derive(Debug, Clone)]
pub struct AssessmentQuestion {
    pub id: Uuid,
    pub question: String,
    pub kind: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub category: String,
    pub difficulty: String,
    pub language: Option<String>,
    pub explanation: Option<String>,
}

/// A completed assessment attempt.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: String,
    pub kind: AssessmentKind,
    pub score: f64,
    pub total_questions: i64,
    pub completed_at: DateTime<Utc>,
}

/// A practice task from the catalog.
#[derive(Debug, Clone)]
pub struct ProgrammingTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub language: String,
    pub difficulty: String,
    pub category: String,
    pub starter_code: Option<String>,
    pub hints: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> TaskStatus {
        match s {
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::InProgress,
        }
    }
}

/// A user's state on one practice task.
#[derive(Debug, Clone)]
pub struct UserTaskProgress {
    pub user_id: String,
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub solution: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields a user may change about themselves. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub experience_level: Option<String>,
    pub focus_areas: Option<Vec<String>>,
    pub preferred_language: Option<String>,
}
