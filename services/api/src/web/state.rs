//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request user extension.

use std::sync::Arc;

use crate::config::Config;
use prog_helper_core::domain::User;
use prog_helper_core::ports::{
    ClassificationService, CompletionService, DatabaseService, IdentityProvider, TitleService,
};
use prog_helper_core::rate_limit::FixedWindowLimiter;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Every external collaborator sits behind a port trait so tests can swap in
/// in-memory or scripted implementations.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub completions: Arc<dyn CompletionService>,
    pub classifier: Arc<dyn ClassificationService>,
    pub titles: Arc<dyn TitleService>,
    pub rate_limiter: Arc<FixedWindowLimiter>,
    pub config: Arc<Config>,
}

/// The authenticated user resolved by the auth middleware, stored in request
/// extensions for handlers to read.
#[derive(Clone)]
pub struct CurrentUser(pub User);
