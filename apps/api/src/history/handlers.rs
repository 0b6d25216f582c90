//! Axum route handlers for the History API.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::client::DeleteConfirmation;
use crate::models::history::{HistoryDraft, HistoryRecord, PatchRequest};
use crate::models::tailoring::{BulletInput, TailoringRequest, TailoringResult};
use crate::session::CallerSession;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// "Save to history": the original inputs plus the bullets being kept.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(flatten)]
    pub request: TailoringRequest,
    pub bullet_points: Vec<BulletInput>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/history
pub async fn handle_list(
    State(state): State<AppState>,
    session: CallerSession,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    Ok(Json(state.history.list(&session).await?))
}

/// POST /api/v1/history
///
/// Builds the draft server-side so the summary and keyword list are always derived
/// the same way. Any owner field in the body is ignored.
pub async fn handle_save(
    State(state): State<AppState>,
    session: CallerSession,
    Json(body): Json<SaveRequest>,
) -> Result<(StatusCode, Json<HistoryRecord>), AppError> {
    let request = body.request.validate().map_err(|_| {
        AppError::Validation("Resume text and job description are required to save.".to_string())
    })?;
    let result = TailoringResult::from_inputs(body.bullet_points)?;
    let draft = HistoryDraft::from_result(&request, result);

    let record = state.history.create(&session, &draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/history/:id
pub async fn handle_get(
    State(state): State<AppState>,
    session: CallerSession,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryRecord>, AppError> {
    Ok(Json(state.history.get_by_id(&session, id).await?))
}

/// PATCH /api/v1/history/:id
pub async fn handle_update(
    State(state): State<AppState>,
    session: CallerSession,
    Path(id): Path<Uuid>,
    Json(body): Json<PatchRequest>,
) -> Result<Json<HistoryRecord>, AppError> {
    let patch = body.into_patch()?;
    Ok(Json(state.history.update(&session, id, &patch).await?))
}

/// DELETE /api/v1/history/:id?confirm=true
///
/// Deletion is permanent, so the caller must confirm explicitly.
pub async fn handle_delete(
    State(state): State<AppState>,
    session: CallerSession,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, AppError> {
    if !params.confirm {
        return Err(AppError::ConfirmationRequired(
            "Deleting a tailored resume is permanent; repeat with confirm=true".to_string(),
        ));
    }

    state
        .history
        .delete(&session, DeleteConfirmation::confirm(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/history/:id/export
///
/// Plain-text bullet points, ready to paste.
pub async fn handle_export(
    State(state): State<AppState>,
    session: CallerSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.history.get_by_id(&session, id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        record.tailored_output.export_text(),
    ))
}
