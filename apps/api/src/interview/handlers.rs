//! Axum route handlers for the Interview API.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::errors::AppError;
use crate::interview::extractor::ExtractedResponse;
use crate::interview::submission::read_answer;
use crate::models::session::{NewSession, Session, SessionId};
use crate::models::turn::TurnAggregate;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<NewSession>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), AppError> {
    let session = state.engine.create_session(request).await?;
    Ok(ApiResponse::created("Session created successfully", session))
}

/// GET /api/v1/sessions/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Session>>, AppError> {
    let session_id: SessionId = session_id.parse()?;
    let session = state.engine.session(&session_id).await?;
    Ok(ApiResponse::ok("Session retrieved successfully", session))
}

/// POST /api/v1/sessions/:session_id/answer
///
/// Runs one interview turn. The answer may arrive as JSON, multipart or URL-encoded form;
/// it may be empty only for the opening request. A client disconnect drops the handler
/// future, and with it any pending generation; a reply already generated is still stored.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    request: Request,
) -> Result<Json<ApiResponse<ExtractedResponse>>, AppError> {
    let session_id: SessionId = session_id.parse()?;
    let answer = read_answer(request).await?;

    let cancel = CancellationToken::new();
    let _disconnect = cancel.clone().drop_guard();

    let turn = state
        .engine
        .submit_answer(&session_id, &answer, &cancel)
        .await?;
    Ok(ApiResponse::ok("Interviewer response generated successfully", turn))
}

/// POST /api/v1/sessions/:session_id/end
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Session>>, AppError> {
    let session_id: SessionId = session_id.parse()?;
    let session = state.engine.end_session(&session_id).await?;
    Ok(ApiResponse::ok("Session ended", session))
}

/// GET /api/v1/sessions/:session_id/turns
pub async fn handle_get_turns(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<TurnAggregate>>, AppError> {
    let session_id: SessionId = session_id.parse()?;
    let turns = state.engine.transcript(&session_id).await?;
    Ok(ApiResponse::ok("Question history retrieved successfully", turns))
}
