use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::tailoring::{
    non_blank, TailoredOutput, TailoredOutputInput, TailoringResult, ValidRequest,
};

/// A persisted tailoring result plus its originating inputs and ownership metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub resume_text: String,
    pub job_description: String,
    pub tailored_output: TailoredOutput,
    pub tailored_summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload. Carries no id, owner or timestamps: the store assigns those,
/// and the owner always comes from the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDraft {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub resume_text: String,
    pub job_description: String,
    pub tailored_output: TailoredOutput,
    #[serde(default)]
    pub tailored_summary: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

impl HistoryDraft {
    /// Builds the draft a "save to history" action persists: the inputs verbatim,
    /// the bullets, and the derived summary and flattened keyword list.
    pub fn from_result(request: &ValidRequest, result: TailoringResult) -> Self {
        let tailored_summary = Some(result.summary());
        let keywords = Some(result.all_keywords());

        Self {
            job_title: request.job_title().map(str::to_string),
            company_name: request.company_name().map(str::to_string),
            resume_text: request.resume_text().to_string(),
            job_description: request.job_description().to_string(),
            tailored_output: result.into_output(),
            tailored_summary,
            keywords,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.resume_text.trim().is_empty() || self.job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "Resume text and job description are required to save.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bullets together with the summary and keyword list derived from them.
/// Only ever built from a `TailoringResult`, so the three always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedOutput {
    pub tailored_output: TailoredOutput,
    pub tailored_summary: String,
    pub keywords: Vec<String>,
}

impl From<TailoringResult> for DerivedOutput {
    fn from(result: TailoringResult) -> Self {
        let tailored_summary = result.summary();
        let keywords = result.all_keywords();
        Self {
            tailored_output: result.into_output(),
            tailored_summary,
            keywords,
        }
    }
}

/// PATCH body. Summary and keywords are not accepted; they follow the bullets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchRequest {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub tailored_output: Option<TailoredOutputInput>,
}

impl PatchRequest {
    /// Normalizes labels the way create does and rebuilds any new bullets through
    /// `TailoringResult`, rejecting repeated ids.
    pub fn into_patch(self) -> Result<HistoryPatch, AppError> {
        let output = self
            .tailored_output
            .map(|o| TailoringResult::from_inputs(o.bullet_points).map(DerivedOutput::from))
            .transpose()?;

        Ok(HistoryPatch {
            job_title: non_blank(self.job_title),
            company_name: non_blank(self.company_name),
            resume_text: self.resume_text,
            job_description: self.job_description,
            output,
        })
    }
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct HistoryPatch {
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
    pub output: Option<DerivedOutput>,
}

impl HistoryPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        let blanked = [&self.resume_text, &self.job_description]
            .into_iter()
            .flatten()
            .any(|v| v.trim().is_empty());
        if blanked {
            return Err(AppError::Validation(
                "Resume text and job description cannot be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the patch in place. Timestamps are the caller's concern.
    pub fn apply_to(&self, record: &mut HistoryRecord) {
        if let Some(v) = &self.job_title {
            record.job_title = Some(v.clone());
        }
        if let Some(v) = &self.company_name {
            record.company_name = Some(v.clone());
        }
        if let Some(v) = &self.resume_text {
            record.resume_text = v.clone();
        }
        if let Some(v) = &self.job_description {
            record.job_description = v.clone();
        }
        if let Some(out) = &self.output {
            record.tailored_output = out.tailored_output.clone();
            record.tailored_summary = Some(out.tailored_summary.clone());
            record.keywords = Some(out.keywords.clone());
        }
    }
}
