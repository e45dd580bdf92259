//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for the tutoring
//! chat. It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    models::{ChatPayload, ChatResponse, ErrorResponse, SessionView},
    progress::UserProgress,
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

fn user_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))
}

/// List the available courses.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "Course names in catalog order", body = [String])
    )
)]
pub async fn list_courses(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.catalog.courses())
}

/// Send one message to the tutor and receive its reply.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "The tutor's reply", body = ChatResponse),
        (status = 400, description = "Bad request", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user chatting")
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatResponse>, ApiError> {
    let user_id = user_id(&headers)?;
    let session_id = payload
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| user_id.to_string());
    let message = payload.message.unwrap_or_default();

    let reply = state.engine.handle(&session_id, &message).await;

    if let Some(progress) = &reply.progress {
        if let Err(e) = state
            .progress
            .record(user_id, &session_id, &progress.course, progress.score)
            .await
        {
            warn!(user_id, session_id = %session_id, error = %e, "Failed to update user progress");
        }
    }

    Ok(Json(ChatResponse {
        response: reply.response,
    }))
}

/// Get the current progress of a conversation.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .engine
        .sessions()
        .snapshot(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session with id '{}' not found", id)))?;

    Ok((StatusCode::OK, Json(SessionView::new(&id, &session))))
}

/// Get the caller's recorded scores across sessions.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Scores per session and course", body = UserProgress),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserProgress>, ApiError> {
    let user_id = user_id(&headers)?;
    let progress = state.progress.user(user_id).await?;
    Ok(Json(progress))
}
