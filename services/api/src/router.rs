//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{ChatPayload, ChatResponse, ErrorResponse, SessionView},
    progress::{SessionProgress, UserProgress},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_courses,
        handlers::chat,
        handlers::get_session,
        handlers::get_progress,
    ),
    components(
        schemas(ChatPayload, ChatResponse, SessionView, UserProgress, SessionProgress, ErrorResponse)
    ),
    tags(
        (name = "Tutor API", description = "Course tutoring chat with quizzes and scores")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/courses", get(handlers::list_courses))
        .route("/chat", post(handlers::chat))
        .route("/sessions/{id}", get(handlers::get_session))
        .route("/progress", get(handlers::get_progress))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
