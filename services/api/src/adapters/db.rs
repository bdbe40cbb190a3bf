//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use prog_helper_core::domain::{
    Assessment, AssessmentKind, AssessmentQuestion, ChatSession, GlobalStats, LanguageProgress,
    Message, MessageRole, ProfileUpdate, ProgrammingTask, Role, Stats, TaskStatus, User,
    UserTaskProgress,
};
use prog_helper_core::ports::{DatabaseService, NewMessage, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn parse_uuid(raw: &str) -> PortResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| PortError::Unexpected(format!("Corrupt id '{raw}': {e}")))
}

fn parse_string_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default()
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: String,
    role: String,
    is_blocked: bool,
    experience_level: Option<String>,
    focus_areas: Option<String>,
    preferred_language: Option<String>,
    onboarding_completed: bool,
    tour_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            role: Role::parse(&self.role),
            is_blocked: self.is_blocked,
            experience_level: self.experience_level,
            focus_areas: parse_string_list(self.focus_areas),
            preferred_language: self.preferred_language,
            onboarding_completed: self.onboarding_completed,
            tour_completed: self.tour_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, role, is_blocked, experience_level, focus_areas, \
     preferred_language, onboarding_completed, tour_completed, created_at, updated_at";

#[derive(FromRow)]
struct SessionRecord {
    id: String,
    user_id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRecord {
    fn to_domain(self) -> PortResult<ChatSession> {
        Ok(ChatSession {
            id: parse_uuid(&self.id)?,
            user_id: self.user_id,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: String,
    user_id: String,
    session_id: Option<String>,
    role: String,
    content: String,
    question_type: Option<String>,
    created_at: DateTime<Utc>,
}

impl MessageRecord {
    fn to_domain(self) -> PortResult<Message> {
        let session_id = match self.session_id {
            Some(raw) => Some(parse_uuid(&raw)?),
            None => None,
        };
        Ok(Message {
            id: parse_uuid(&self.id)?,
            user_id: self.user_id,
            session_id,
            role: MessageRole::parse(&self.role),
            content: self.content,
            question_type: self.question_type,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct StatsRecord {
    user_id: String,
    questions_asked: i64,
    tasks_completed: i64,
    avg_response_time: f64,
    most_frequent_response_type: Option<String>,
    updated_at: DateTime<Utc>,
}

impl StatsRecord {
    fn to_domain(self) -> Stats {
        Stats {
            user_id: self.user_id,
            questions_asked: self.questions_asked,
            tasks_completed: self.tasks_completed,
            avg_response_time: self.avg_response_time,
            most_frequent_response_type: self.most_frequent_response_type,
            updated_at: self.updated_at,
        }
    }
}

const STATS_COLUMNS: &str = "user_id, questions_asked, tasks_completed, avg_response_time, \
     most_frequent_response_type, updated_at";

#[derive(FromRow)]
struct LanguageProgressRecord {
    user_id: String,
    language: String,
    questions_asked: i64,
    tasks_completed: i64,
    last_used_at: DateTime<Utc>,
}

impl LanguageProgressRecord {
    fn to_domain(self) -> LanguageProgress {
        LanguageProgress {
            user_id: self.user_id,
            language: self.language,
            questions_asked: self.questions_asked,
            tasks_completed: self.tasks_completed,
            last_used_at: self.last_used_at,
        }
    }
}

#[derive(FromRow)]
struct AssessmentQuestionRecord {
    id: String,
    question: String,
    kind: String,
    options: Option<String>,
    correct_answer: String,
    category: String,
    difficulty: String,
    language: Option<String>,
    explanation: Option<String>,
}

impl AssessmentQuestionRecord {
    fn to_domain(self) -> PortResult<AssessmentQuestion> {
        Ok(AssessmentQuestion {
            id: parse_uuid(&self.id)?,
            question: self.question,
            kind: self.kind,
            options: parse_string_list(self.options),
            correct_answer: self.correct_answer,
            category: self.category,
            difficulty: self.difficulty,
            language: self.language,
            explanation: self.explanation,
        })
    }
}

#[derive(FromRow)]
struct AssessmentRecord {
    id: String,
    user_id: String,
    kind: String,
    score: f64,
    total_questions: i64,
    completed_at: DateTime<Utc>,
}

impl AssessmentRecord {
    fn to_domain(self) -> PortResult<Assessment> {
        Ok(Assessment {
            id: parse_uuid(&self.id)?,
            user_id: self.user_id,
            kind: AssessmentKind::parse(&self.kind),
            score: self.score,
            total_questions: self.total_questions,
            completed_at: self.completed_at,
        })
    }
}

#[derive(FromRow)]
struct TaskRecord {
    id: String,
    title: String,
    description: String,
    language: String,
    difficulty: String,
    category: String,
    starter_code: Option<String>,
    hints: Option<String>,
    created_at: DateTime<Utc>,
}

impl TaskRecord {
    fn to_domain(self) -> PortResult<ProgrammingTask> {
        Ok(ProgrammingTask {
            id: parse_uuid(&self.id)?,
            title: self.title,
            description: self.description,
            language: self.language,
            difficulty: self.difficulty,
            category: self.category,
            starter_code: self.starter_code,
            hints: parse_string_list(self.hints),
            created_at: self.created_at,
        })
    }
}

const TASK_COLUMNS: &str =
    "id, title, description, language, difficulty, category, starter_code, hints, created_at";

#[derive(FromRow)]
struct TaskProgressRecord {
    user_id: String,
    task_id: String,
    status: String,
    solution: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

impl TaskProgressRecord {
    fn to_domain(self) -> PortResult<UserTaskProgress> {
        Ok(UserTaskProgress {
            user_id: self.user_id,
            task_id: parse_uuid(&self.task_id)?,
            status: TaskStatus::parse(&self.status),
            solution: self.solution,
            completed_at: self.completed_at,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_user(&self, user_id: &str, admin: bool) -> PortResult<User> {
        let now = Utc::now();
        let role = if admin { Role::Admin } else { Role::User };
        sqlx::query(
            "INSERT INTO users (id, role, created_at, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        // An email added to the admin list later still promotes the existing row.
        if admin {
            sqlx::query("UPDATE users SET role = 'admin', updated_at = ? WHERE id = ? AND role <> 'admin'")
                .bind(now)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        }

        self.get_user(user_id).await
    }

    async fn get_user(&self, user_id: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn set_user_blocked(&self, user_id: &str, blocked: bool) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET is_blocked = ?, updated_at = ? WHERE id = ?")
            .bind(blocked)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> PortResult<User> {
        let focus_areas = match &update.focus_areas {
            Some(areas) => Some(
                serde_json::to_string(areas)
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            None => None,
        };
        let result = sqlx::query(
            "UPDATE users SET \
                 experience_level = COALESCE(?, experience_level), \
                 focus_areas = COALESCE(?, focus_areas), \
                 preferred_language = COALESCE(?, preferred_language), \
                 updated_at = ? \
             WHERE id = ?",
        )
        .bind(update.experience_level)
        .bind(focus_areas)
        .bind(update.preferred_language)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        self.get_user(user_id).await
    }

    async fn set_onboarding_completed(&self, user_id: &str) -> PortResult<()> {
        sqlx::query("UPDATE users SET onboarding_completed = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn set_tour_completed(&self, user_id: &str) -> PortResult<()> {
        sqlx::query("UPDATE users SET tour_completed = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_chat_session(&self, user_id: &str, title: &str) -> PortResult<ChatSession> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, user_id, title, created_at, updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(title)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_chat_session(&self, user_id: &str, session_id: Uuid) -> PortResult<ChatSession> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, title, created_at, updated_at FROM chat_sessions \
             WHERE id = ? AND user_id = ?",
        )
        .bind(session_id.to_string())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Session {} not found", session_id))
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_chat_sessions(&self, user_id: &str) -> PortResult<Vec<ChatSession>> {
        let records = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, title, created_at, updated_at FROM chat_sessions \
             WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn touch_chat_session(&self, session_id: Uuid) -> PortResult<()> {
        sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn rename_chat_session(&self, session_id: Uuid, title: &str) -> PortResult<()> {
        sqlx::query("UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(Utc::now())
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_chat_session(&self, user_id: &str, session_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ? AND user_id = ?")
            .bind(session_id.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn append_message(&self, new: NewMessage) -> PortResult<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "INSERT INTO messages (id, user_id, session_id, role, content, question_type, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, user_id, session_id, role, content, question_type, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&new.user_id)
        .bind(new.session_id.map(|id| id.to_string()))
        .bind(new.role.as_str())
        .bind(&new.content)
        .bind(&new.question_type)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn session_messages(&self, user_id: &str, session_id: Uuid) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, user_id, session_id, role, content, question_type, created_at \
             FROM messages WHERE session_id = ? AND user_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id.to_string())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_session_messages(&self, session_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn recent_question_types(&self, user_id: &str, limit: i64) -> PortResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT question_type FROM messages \
             WHERE user_id = ? AND role = 'user' AND question_type IS NOT NULL \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn get_stats(&self, user_id: &str) -> PortResult<Option<Stats>> {
        let record = sqlx::query_as::<_, StatsRecord>(&format!(
            "SELECT {STATS_COLUMNS} FROM stats WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn record_question(
        &self,
        user_id: &str,
        response_time_secs: f64,
        most_frequent_type: &str,
    ) -> PortResult<Stats> {
        // One atomic upsert: the incremental mean and the counter move
        // together, so concurrent messages cannot read a stale pair.
        let record = sqlx::query_as::<_, StatsRecord>(&format!(
            "INSERT INTO stats (user_id, questions_asked, tasks_completed, avg_response_time, \
                                most_frequent_response_type, updated_at) \
             VALUES (?, 1, 0, ?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 avg_response_time = (stats.avg_response_time * stats.questions_asked \
                                      + excluded.avg_response_time) / (stats.questions_asked + 1), \
                 questions_asked = stats.questions_asked + 1, \
                 most_frequent_response_type = excluded.most_frequent_response_type, \
                 updated_at = excluded.updated_at \
             RETURNING {STATS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(response_time_secs)
        .bind(most_frequent_type)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn record_task_completion(&self, user_id: &str) -> PortResult<Stats> {
        let record = sqlx::query_as::<_, StatsRecord>(&format!(
            "INSERT INTO stats (user_id, questions_asked, tasks_completed, avg_response_time, \
                                most_frequent_response_type, updated_at) \
             VALUES (?, 0, 1, 0, NULL, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 tasks_completed = stats.tasks_completed + 1, \
                 updated_at = excluded.updated_at \
             RETURNING {STATS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn global_stats(&self) -> PortResult<GlobalStats> {
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let active_users = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT user_id) FROM messages WHERE role = 'user'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let by_role = sqlx::query_as::<_, (String, i64)>(
            "SELECT role, COUNT(*) FROM messages GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut stats = GlobalStats {
            total_users,
            active_users,
            ..Default::default()
        };
        for (role, count) in by_role {
            match role.as_str() {
                "user" => stats.total_questions = count,
                "assistant" => stats.total_solutions = count,
                _ => {}
            }
        }
        Ok(stats)
    }

    async fn bump_language_progress(
        &self,
        user_id: &str,
        language: &str,
        questions: i64,
        tasks: i64,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO language_progress (user_id, language, questions_asked, tasks_completed, last_used_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(user_id, language) DO UPDATE SET \
                 questions_asked = language_progress.questions_asked + excluded.questions_asked, \
                 tasks_completed = language_progress.tasks_completed + excluded.tasks_completed, \
                 last_used_at = excluded.last_used_at",
        )
        .bind(user_id)
        .bind(language)
        .bind(questions)
        .bind(tasks)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_language_progress(&self, user_id: &str) -> PortResult<Vec<LanguageProgress>> {
        let records = sqlx::query_as::<_, LanguageProgressRecord>(
            "SELECT user_id, language, questions_asked, tasks_completed, last_used_at \
             FROM language_progress WHERE user_id = ? ORDER BY language ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn ensure_language_rows(&self, user_id: &str, languages: &[String]) -> PortResult<()> {
        // INSERT OR IGNORE keeps repeat calls idempotent: existing counters
        // are left untouched.
        for language in languages {
            sqlx::query(
                "INSERT OR IGNORE INTO language_progress \
                     (user_id, language, questions_asked, tasks_completed, last_used_at) \
                 VALUES (?, ?, 0, 0, ?)",
            )
            .bind(user_id)
            .bind(language)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        }
        Ok(())
    }

    async fn list_assessment_questions(
        &self,
        language: Option<&str>,
        difficulty: Option<&str>,
    ) -> PortResult<Vec<AssessmentQuestion>> {
        let records = sqlx::query_as::<_, AssessmentQuestionRecord>(
            "SELECT id, question, kind, options, correct_answer, category, difficulty, language, explanation \
             FROM assessment_questions \
             WHERE (? IS NULL OR language = ?) AND (? IS NULL OR difficulty = ?) \
             ORDER BY difficulty ASC, category ASC",
        )
        .bind(language)
        .bind(language)
        .bind(difficulty)
        .bind(difficulty)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_assessment(
        &self,
        user_id: &str,
        kind: AssessmentKind,
        score: f64,
        total_questions: i64,
        answers_json: &str,
    ) -> PortResult<Assessment> {
        let record = sqlx::query_as::<_, AssessmentRecord>(
            "INSERT INTO assessments (id, user_id, kind, score, total_questions, answers, completed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, user_id, kind, score, total_questions, completed_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(kind.as_str())
        .bind(score)
        .bind(total_questions)
        .bind(answers_json)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn latest_assessment(
        &self,
        user_id: &str,
        kind: AssessmentKind,
    ) -> PortResult<Option<Assessment>> {
        let record = sqlx::query_as::<_, AssessmentRecord>(
            "SELECT id, user_id, kind, score, total_questions, completed_at FROM assessments \
             WHERE user_id = ? AND kind = ? ORDER BY completed_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn list_tasks(
        &self,
        language: Option<&str>,
        difficulty: Option<&str>,
    ) -> PortResult<Vec<ProgrammingTask>> {
        let records = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {TASK_COLUMNS} FROM programming_tasks \
             WHERE (? IS NULL OR language = ?) AND (? IS NULL OR difficulty = ?) \
             ORDER BY created_at ASC"
        ))
        .bind(language)
        .bind(language)
        .bind(difficulty)
        .bind(difficulty)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_task(&self, task_id: Uuid) -> PortResult<ProgrammingTask> {
        let record = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {TASK_COLUMNS} FROM programming_tasks WHERE id = ?"
        ))
        .bind(task_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Task {} not found", task_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn upsert_task_progress(
        &self,
        user_id: &str,
        task_id: Uuid,
        status: TaskStatus,
        solution: Option<&str>,
    ) -> PortResult<UserTaskProgress> {
        let completed_at = match status {
            TaskStatus::Completed => Some(Utc::now()),
            TaskStatus::InProgress => None,
        };
        let record = sqlx::query_as::<_, TaskProgressRecord>(
            "INSERT INTO user_task_progress (user_id, task_id, status, solution, completed_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(user_id, task_id) DO UPDATE SET \
                 status = excluded.status, \
                 solution = COALESCE(excluded.solution, user_task_progress.solution), \
                 completed_at = COALESCE(excluded.completed_at, user_task_progress.completed_at) \
             RETURNING user_id, task_id, status, solution, completed_at",
        )
        .bind(user_id)
        .bind(task_id.to_string())
        .bind(status.as_str())
        .bind(solution)
        .bind(completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_task_progress(
        &self,
        user_id: &str,
        task_id: Uuid,
    ) -> PortResult<Option<UserTaskProgress>> {
        let record = sqlx::query_as::<_, TaskProgressRecord>(
            "SELECT user_id, task_id, status, solution, completed_at FROM user_task_progress \
             WHERE user_id = ? AND task_id = ?",
        )
        .bind(user_id)
        .bind(task_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn list_task_progress(&self, user_id: &str) -> PortResult<Vec<UserTaskProgress>> {
        let records = sqlx::query_as::<_, TaskProgressRecord>(
            "SELECT user_id, task_id, status, solution, completed_at FROM user_task_progress \
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_contact_message(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, subject, message, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}
