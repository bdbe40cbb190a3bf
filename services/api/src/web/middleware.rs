//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};
use prog_helper_core::domain::Role;
use prog_helper_core::ports::PortError;

/// Pulls the session token from the `Authorization: Bearer` header or the
/// `session` cookie.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let cookie_header = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix("session=").map(|t| t.to_string())
    })
}

/// Middleware that validates the session token with the auth provider,
/// mirrors the identity into a local user row, and rejects blocked users.
///
/// On success the resolved `CurrentUser` is inserted into request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&req).ok_or(PortError::Unauthorized)?;

    let identity = state.identity.verify_session(&token).await.map_err(|e| {
        if !matches!(e, PortError::Unauthorized) {
            error!("Failed to verify session with auth provider: {:?}", e);
        }
        PortError::Unauthorized
    })?;

    let admin = state.config.is_admin_email(identity.email.as_deref());
    let user = state
        .db
        .get_or_create_user(&identity.user_id, admin)
        .await?;

    if user.is_blocked {
        return Err(PortError::Forbidden("User account is blocked".to_string()).into());
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware for the admin tier. Must be layered inside `require_auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = req
        .extensions()
        .get::<CurrentUser>()
        .map(|CurrentUser(user)| user.role == Role::Admin)
        .unwrap_or(false);

    if !is_admin {
        return Err(PortError::Forbidden("Admin access required".to_string()).into());
    }
    Ok(next.run(req).await)
}
