//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, MessageView, QueuedResponse, SessionCreatedResponse, SessionListItem,
    SessionListResponse, SessionResponse, SuccessResponse, TextRequest,
};
use super::AppState;
use crate::runtime::{ManagerError, SessionSnapshot};
use crate::state_machine::Event;
use crate::store::{CampaignParameters, StoreError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session listing and creation
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/delete", post(delete_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/brainstorm", post(send_brainstorm))
        .route("/api/sessions/:id/profile", put(edit_profile))
        .route("/api/sessions/:id/profile/submit", post(submit_profile))
        .route(
            "/api/sessions/:id/messages/:message_id/approve",
            post(approve_message),
        )
        .route("/api/sessions/:id/restore", post(restore_checkpoint))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Sessions
// ============================================================

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions = state
        .sessions
        .list_sessions()
        .await
        .into_iter()
        .map(|(summary, busy)| SessionListItem { summary, busy })
        .collect();
    Json(SessionListResponse { sessions })
}

async fn create_session(State(state): State<AppState>) -> Json<SessionCreatedResponse> {
    let session = state.sessions.create_session().await;
    Json(SessionCreatedResponse {
        id: session.id,
        created_at: session.created_at,
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let snapshot = state.sessions.get_session(&id).await?;
    Ok(Json(session_response(snapshot)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.delete_session(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

fn session_response(snapshot: SessionSnapshot) -> SessionResponse {
    let stage = snapshot.stage();
    let SessionSnapshot { session, state } = snapshot;
    let has_checkpoint = session.has_checkpoint();
    SessionResponse {
        messages: MessageView::list(&session.id, session.messages),
        id: session.id,
        created_at: session.created_at,
        parameters: session.parameters,
        stage,
        busy: state.is_busy(),
        has_checkpoint,
    }
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (broadcast_rx, snapshot) = state.sessions.subscribe(&id).await?;

    let view = session_response(snapshot);
    let init = json!({
        "type": "init",
        "session": view,
    });

    Ok(sse_stream(id, init, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let text = non_empty(req.text)?;
    state
        .sessions
        .send_event(&id, Event::UserText { text })
        .await?;
    Ok(Json(QueuedResponse::queued()))
}

async fn send_brainstorm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let text = non_empty(req.text)?;
    state
        .sessions
        .send_event(&id, Event::BrainstormRequested { text })
        .await?;
    Ok(Json(QueuedResponse::queued()))
}

async fn edit_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(parameters): Json<CampaignParameters>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .sessions
        .send_event(&id, Event::ProfileEdited { parameters })
        .await?;
    Ok(Json(QueuedResponse::queued()))
}

async fn submit_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .sessions
        .send_event(&id, Event::ProfileSubmitted)
        .await?;
    Ok(Json(QueuedResponse::queued()))
}

async fn approve_message(
    State(state): State<AppState>,
    Path((id, message_id)): Path<(String, String)>,
) -> Result<Json<QueuedResponse>, AppError> {
    state.sessions.approve(&id, &message_id).await?;
    Ok(Json(QueuedResponse::queued()))
}

async fn restore_checkpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueuedResponse>, AppError> {
    state
        .sessions
        .send_event(&id, Event::RestoreRequested)
        .await?;
    Ok(Json(QueuedResponse::queued()))
}

fn non_empty(text: String) -> Result<String, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("Text must not be empty".to_string()));
    }
    Ok(text)
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("campaign-genius ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<ManagerError> for AppError {
    fn from(e: ManagerError) -> Self {
        match e {
            ManagerError::Store(StoreError::SessionNotFound(_) | StoreError::MessageNotFound(_)) => {
                AppError::NotFound(e.to_string())
            }
            ManagerError::Store(StoreError::NoCheckpoint) | ManagerError::NotAProposal(_) => {
                AppError::BadRequest(e.to_string())
            }
            ManagerError::RuntimeStopped => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
