//! services/api/src/web/contact.rs
//!
//! Public contact form. Messages are persisted for later review.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use prog_helper_core::ports::PortError;

#[derive(Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Store a contact-form submission.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 204, description = "Message stored"),
        (status = 400, description = "Missing or invalid field")
    )
)]
pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = request.name.trim();
    let email = request.email.trim();
    let subject = request.subject.trim();
    let message = request.message.trim();

    if name.is_empty() || subject.is_empty() || message.is_empty() {
        return Err(PortError::Invalid("All fields are required".to_string()).into());
    }
    if !email.contains('@') {
        return Err(PortError::Invalid("Invalid email address".to_string()).into());
    }

    state
        .db
        .save_contact_message(name, email, subject, message)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
