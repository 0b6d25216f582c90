//! Resume upload: pulls plain text out of a PDF so it can be used as `resume_text`.

use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts the text layer of an uploaded PDF.
///
/// Parsing runs on the blocking pool; a parser panic on a malformed file is
/// reported as unprocessable instead of taking the worker down.
pub async fn extract_resume_text(data: Bytes) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if !data.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation(
            "Only PDF resumes are supported".to_string(),
        ));
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            warn!("PDF extraction task failed: {e}");
            AppError::UnprocessableEntity("Could not read this PDF".to_string())
        })?
        .map_err(|e| {
            warn!("PDF extraction failed: {e:?}");
            AppError::UnprocessableEntity("Could not read this PDF".to_string())
        })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No selectable text found in this PDF".to_string(),
        ));
    }
    Ok(text.to_string())
}
