pub mod admin;
pub mod assessment;
pub mod chat;
pub mod contact;
pub mod middleware;
pub mod onboarding;
pub mod profile;
pub mod state;
pub mod stats;
pub mod tasks;

pub use middleware::{require_admin, require_auth};
pub use state::{AppState, CurrentUser};

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;

/// Assembles the three routing tiers over a shared state: public,
/// authenticated, and admin. Cross-cutting layers (CORS, Swagger UI) are
/// added by the caller.
pub fn router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/stats/global", get(stats::global_stats_handler))
        .route("/contact", post(contact::contact_handler));

    let protected_routes = Router::new()
        .route("/chat/messages", post(chat::send_message_handler))
        .route("/chat/sessions", get(chat::list_sessions_handler))
        .route(
            "/chat/sessions/{session_id}",
            delete(chat::delete_session_handler),
        )
        .route(
            "/chat/sessions/{session_id}/messages",
            get(chat::get_messages_handler),
        )
        .route("/stats/me", get(stats::my_stats_handler))
        .route("/profile/me", get(profile::me_handler))
        .route("/profile", put(profile::update_profile_handler))
        .route(
            "/profile/languages",
            get(profile::list_languages_handler).put(profile::track_languages_handler),
        )
        .route(
            "/onboarding/complete",
            post(onboarding::complete_onboarding_handler),
        )
        .route(
            "/onboarding/tour-complete",
            post(onboarding::complete_tour_handler),
        )
        .route(
            "/assessments/questions",
            get(assessment::list_questions_handler),
        )
        .route(
            "/assessments/eligibility",
            get(assessment::eligibility_handler),
        )
        .route(
            "/assessments/{kind}/submit",
            post(assessment::submit_assessment_handler),
        )
        .route(
            "/assessments/{kind}/latest",
            get(assessment::latest_assessment_handler),
        )
        .route("/tasks", get(tasks::list_tasks_handler))
        .route("/tasks/progress", get(tasks::list_progress_handler))
        .route("/tasks/{task_id}", get(tasks::get_task_handler))
        .route("/tasks/{task_id}/start", post(tasks::start_task_handler))
        .route(
            "/tasks/{task_id}/complete",
            post(tasks::complete_task_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users_handler))
        .route(
            "/admin/users/{user_id}/block",
            post(admin::block_user_handler),
        )
        .route(
            "/admin/users/{user_id}/unblock",
            post(admin::unblock_user_handler),
        )
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
}

/// The OpenAPI document covering every REST endpoint. Served by the Swagger
/// UI and exported by the `openapi` binary.
#[derive(OpenApi)]
#[openapi(
    paths(
        chat::send_message_handler,
        chat::list_sessions_handler,
        chat::get_messages_handler,
        chat::delete_session_handler,
        stats::my_stats_handler,
        stats::global_stats_handler,
        profile::me_handler,
        profile::update_profile_handler,
        profile::list_languages_handler,
        profile::track_languages_handler,
        onboarding::complete_onboarding_handler,
        onboarding::complete_tour_handler,
        assessment::list_questions_handler,
        assessment::submit_assessment_handler,
        assessment::latest_assessment_handler,
        assessment::eligibility_handler,
        tasks::list_tasks_handler,
        tasks::get_task_handler,
        tasks::list_progress_handler,
        tasks::start_task_handler,
        tasks::complete_task_handler,
        admin::list_users_handler,
        admin::block_user_handler,
        admin::unblock_user_handler,
        contact::contact_handler,
    ),
    components(schemas(
        chat::SendMessageRequest,
        chat::SendMessageResponse,
        chat::MessageResponse,
        chat::SessionResponse,
        stats::StatsResponse,
        stats::GlobalStatsResponse,
        profile::UserResponse,
        profile::UpdateProfileRequest,
        profile::LanguageProgressResponse,
        profile::TrackLanguagesRequest,
        onboarding::CompleteOnboardingRequest,
        assessment::QuestionResponse,
        assessment::SubmitAssessmentRequest,
        assessment::AssessmentResponse,
        assessment::EligibilityResponse,
        tasks::TaskResponse,
        tasks::TaskProgressResponse,
        tasks::CompleteTaskRequest,
        contact::ContactRequest,
    )),
    tags(
        (name = "prog-helper-api", description = "Programming helper REST API")
    )
)]
pub struct ApiDoc;
