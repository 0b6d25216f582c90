//! Axum route handlers for the Tailoring API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::tailoring::{TailoringRequest, TailoringResult};
use crate::session::{CallerSession, SessionGate};
use crate::state::AppState;
use crate::tailoring::engine::tailor;
use crate::tailoring::highlight::highlight;
use crate::tailoring::pdf::extract_resume_text;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HighlightedBullet {
    pub id: u32,
    pub text: String,
    pub keywords: Vec<String>,
    /// `text` with each keyword wrapped in `<mark>`.
    pub highlighted: String,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub bullet_points: Vec<HighlightedBullet>,
    pub all_keywords: Vec<String>,
    pub summary: String,
}

impl From<&TailoringResult> for TailorResponse {
    fn from(result: &TailoringResult) -> Self {
        let bullet_points = result
            .bullet_points()
            .iter()
            .map(|b| HighlightedBullet {
                id: b.id,
                text: b.text.clone(),
                keywords: b.keywords.clone(),
                highlighted: highlight(&b.text, &b.keywords),
            })
            .collect();

        TailorResponse {
            bullet_points,
            all_keywords: result.all_keywords(),
            summary: result.summary(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HighlightRequest {
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HighlightResponse {
    pub markup: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub resume_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/tailor
///
/// Signed-in callers get at most one tailoring call in flight; anonymous calls
/// have no identity to key on and are not limited. Dropping the request
/// (client disconnect) cancels the engine call and frees the slot.
pub async fn handle_tailor(
    State(state): State<AppState>,
    session: CallerSession,
    Json(request): Json<TailoringRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let _inflight = session
        .current_caller_id()
        .map(|caller| state.inflight.try_acquire(caller))
        .transpose()?;

    let (_, result) = tailor(state.engine.as_ref(), request).await?;

    Ok(Json(TailorResponse::from(&result)))
}

/// POST /api/v1/highlight
pub async fn handle_highlight(Json(request): Json<HighlightRequest>) -> Json<HighlightResponse> {
    Json(HighlightResponse {
        markup: highlight(&request.text, &request.keywords),
    })
}

/// POST /api/v1/resumes/extract
///
/// Multipart upload with a single `file` field holding a PDF resume.
pub async fn handle_extract_resume(
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        let resume_text = extract_resume_text(data).await?;
        return Ok(Json(ExtractResponse { resume_text }));
    }

    Err(AppError::Validation(
        "Missing 'file' field in upload".to_string(),
    ))
}
