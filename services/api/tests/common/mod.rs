//! Shared helpers for the integration tests: an in-memory database behind the
//! real adapter, plus scripted implementations of the provider ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use api_lib::adapters::db::DbAdapter;
use api_lib::config::Config;
use api_lib::web::state::AppState;
use prog_helper_core::domain::{ChatTurn, Identity};
use prog_helper_core::ports::{
    ClassificationService, CompletionService, IdentityProvider, PortError, PortResult,
    TitleService,
};
use prog_helper_core::rate_limit::FixedWindowLimiter;

/// A migrated in-memory database. One connection so every query sees the same
/// memory database.
pub async fn test_db() -> (Arc<DbAdapter>, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    let adapter = DbAdapter::new(pool.clone());
    adapter.run_migrations().await.expect("migrations");
    (Arc::new(adapter), pool)
}

/// Completion port that returns a fixed reply, or errors when told to fail.
pub struct ScriptedCompletion {
    pub reply: String,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        let scripted = Self::new("unused");
        scripted.fail.store(true, Ordering::SeqCst);
        scripted
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn generate_reply(
        &self,
        _system_prompt: &str,
        _history: &[ChatTurn],
        _message: &str,
    ) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("completion provider down".to_string()));
        }
        Ok(self.reply.clone())
    }
}

/// Classification port returning a fixed label, or erroring when told to.
pub struct ScriptedClassifier {
    pub label: String,
    pub fail: AtomicBool,
}

impl ScriptedClassifier {
    pub fn new(label: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let scripted = Self::new("unused");
        scripted.fail.store(true, Ordering::SeqCst);
        scripted
    }
}

#[async_trait]
impl ClassificationService for ScriptedClassifier {
    async fn classify_question(&self, _message: &str) -> PortResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("classifier down".to_string()));
        }
        Ok(self.label.clone())
    }
}

/// Title port returning a fixed title and counting invocations.
pub struct ScriptedTitles {
    pub title: String,
    pub calls: AtomicUsize,
}

impl ScriptedTitles {
    pub fn new(title: &str) -> Arc<Self> {
        Arc::new(Self {
            title: title.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TitleService for ScriptedTitles {
    async fn generate_title(&self, _message: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.title.clone())
    }
}

/// Identity port for flows that never touch authentication.
pub struct DeniedIdentity;

#[async_trait]
impl IdentityProvider for DeniedIdentity {
    async fn verify_session(&self, _token: &str) -> PortResult<Identity> {
        Err(PortError::Unauthorized)
    }
}

/// Identity port resolving a fixed token -> identity table. Anything not in
/// the table is rejected as unauthorized.
pub struct TokenIdentity {
    sessions: HashMap<String, Identity>,
}

impl TokenIdentity {
    pub fn new(sessions: &[(&str, &str, Option<&str>)]) -> Arc<Self> {
        Arc::new(Self {
            sessions: sessions
                .iter()
                .map(|(token, user_id, email)| {
                    (
                        token.to_string(),
                        Identity {
                            user_id: user_id.to_string(),
                            email: email.map(|e| e.to_string()),
                        },
                    )
                })
                .collect(),
        })
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    async fn verify_session(&self, token: &str) -> PortResult<Identity> {
        self.sessions
            .get(token)
            .cloned()
            .ok_or(PortError::Unauthorized)
    }
}

pub fn test_config(chat_rate_limit: u32) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("bind address"),
        database_url: "sqlite::memory:".to_string(),
        log_level: tracing::Level::INFO,
        allowed_origin: "http://localhost:3000".to_string(),
        openai_api_key: None,
        chat_model: "scripted".to_string(),
        classify_model: "scripted".to_string(),
        title_model: "scripted".to_string(),
        auth_base_url: "http://localhost:0".to_string(),
        auth_api_key: None,
        admin_emails: Vec::new(),
        chat_rate_limit,
        chat_rate_window_ms: 60_000,
    }
}

pub fn build_state(
    db: Arc<DbAdapter>,
    completions: Arc<ScriptedCompletion>,
    classifier: Arc<ScriptedClassifier>,
    titles: Arc<ScriptedTitles>,
    chat_rate_limit: u32,
) -> AppState {
    AppState {
        db,
        identity: Arc::new(DeniedIdentity),
        completions,
        classifier,
        titles,
        rate_limiter: Arc::new(FixedWindowLimiter::new()),
        config: Arc::new(test_config(chat_rate_limit)),
    }
}

/// State wired with a scripted identity provider and an admin allow-list, for
/// tests that exercise the authenticated routing tiers.
pub fn build_state_with_identity(
    db: Arc<DbAdapter>,
    identity: Arc<TokenIdentity>,
    admin_emails: Vec<String>,
) -> AppState {
    let mut config = test_config(10);
    config.admin_emails = admin_emails;
    AppState {
        db,
        identity,
        completions: ScriptedCompletion::new("ok"),
        classifier: ScriptedClassifier::new("General Programming"),
        titles: ScriptedTitles::new("Session"),
        rate_limiter: Arc::new(FixedWindowLimiter::new()),
        config: Arc::new(config),
    }
}

/// Serves the full router on an ephemeral port and returns the base URL.
pub async fn spawn_app(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let app = api_lib::web::router(Arc::new(state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}
