//! Value objects that flow from input capture to display to persistence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Number of keywords named in the generated summary sentence.
const SUMMARY_KEYWORD_COUNT: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Raw tailoring input as submitted by the caller. Not yet validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

impl TailoringRequest {
    /// Checks the required fields and normalizes the optional ones.
    ///
    /// Required texts are kept verbatim once they pass; optional labels are
    /// trimmed and dropped when blank.
    pub fn validate(self) -> Result<ValidRequest, AppError> {
        if self.resume_text.trim().is_empty() || self.job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in both resume and job description".to_string(),
            ));
        }

        Ok(ValidRequest {
            resume_text: self.resume_text,
            job_description: self.job_description,
            job_title: non_blank(self.job_title),
            company_name: non_blank(self.company_name),
        })
    }
}

/// A request that passed validation. Engines only ever see this type.
#[derive(Debug, Clone, Serialize)]
pub struct ValidRequest {
    resume_text: String,
    job_description: String,
    job_title: Option<String>,
    company_name: Option<String>,
}

impl ValidRequest {
    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn job_title(&self) -> Option<&str> {
        self.job_title.as_deref()
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

/// One tailored sentence and the keywords it targets, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletPoint {
    pub id: u32,
    pub text: String,
    pub keywords: Vec<String>,
}

/// A bullet point as clients and engines send it. Stored history and some engines
/// omit `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulletInput {
    #[serde(default)]
    pub id: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Keeps explicit ids and numbers the rest after the largest explicit one, so an
/// all-unnumbered list comes out as 1..=n in order.
fn assign_ids(inputs: Vec<BulletInput>) -> Vec<BulletPoint> {
    let mut next = inputs.iter().filter_map(|b| b.id).max().unwrap_or(0);
    inputs
        .into_iter()
        .map(|input| {
            let id = input.id.unwrap_or_else(|| {
                next = next.saturating_add(1);
                next
            });
            BulletPoint {
                id,
                text: input.text,
                keywords: input.keywords,
            }
        })
        .collect()
}

impl BulletPoint {
    pub fn new(id: u32, text: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            id,
            text: text.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ranked bullet points produced by a tailoring engine. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailoringResult {
    bullet_points: Vec<BulletPoint>,
}

impl TailoringResult {
    /// Builds a result, dropping repeated keywords inside each bullet.
    /// Bullet ids must be unique.
    pub fn new(bullet_points: Vec<BulletPoint>) -> Result<Self, AppError> {
        let mut seen_ids = HashSet::new();
        let mut normalized = Vec::with_capacity(bullet_points.len());

        for mut bullet in bullet_points {
            if !seen_ids.insert(bullet.id) {
                return Err(AppError::Validation(format!(
                    "Duplicate bullet point id {}",
                    bullet.id
                )));
            }
            bullet.keywords = dedup_in_order(bullet.keywords.iter().map(String::as_str));
            normalized.push(bullet);
        }

        Ok(Self {
            bullet_points: normalized,
        })
    }

    /// Like `new`, for wire input. Missing ids are assigned; repeated explicit
    /// ids are still rejected.
    pub fn from_inputs(inputs: Vec<BulletInput>) -> Result<Self, AppError> {
        Self::new(assign_ids(inputs))
    }

    pub fn bullet_points(&self) -> &[BulletPoint] {
        &self.bullet_points
    }

    pub fn is_empty(&self) -> bool {
        self.bullet_points.is_empty()
    }

    /// Union of every bullet's keywords, first-seen order.
    pub fn all_keywords(&self) -> Vec<String> {
        dedup_in_order(
            self.bullet_points
                .iter()
                .flat_map(|b| b.keywords.iter().map(String::as_str)),
        )
    }

    /// Default history label: bullet count plus the first few keywords.
    pub fn summary(&self) -> String {
        let keywords = self.all_keywords();
        let focus: Vec<&str> = keywords
            .iter()
            .take(SUMMARY_KEYWORD_COUNT)
            .map(String::as_str)
            .collect();

        format!(
            "Generated {} tailored bullet points focusing on {} and other key skills.",
            self.bullet_points.len(),
            focus.join(", ")
        )
    }

    pub fn into_output(self) -> TailoredOutput {
        TailoredOutput {
            bullet_points: self.bullet_points,
        }
    }
}

/// Persisted shape of a tailoring result (`tailored_output` column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TailoredOutputInput")]
pub struct TailoredOutput {
    pub bullet_points: Vec<BulletPoint>,
}

/// Wire shape of `tailored_output`: bullets with optional ids.
#[derive(Debug, Clone, Deserialize)]
pub struct TailoredOutputInput {
    pub bullet_points: Vec<BulletInput>,
}

impl From<TailoredOutputInput> for TailoredOutput {
    fn from(input: TailoredOutputInput) -> Self {
        TailoredOutput {
            bullet_points: assign_ids(input.bullet_points),
        }
    }
}

impl TailoredOutput {
    /// Plain-text payload for "copy all": bullet texts separated by a blank line.
    pub fn export_text(&self) -> String {
        self.bullet_points
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn dedup_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(resume: &str, jd: &str) -> TailoringRequest {
        TailoringRequest {
            resume_text: resume.to_string(),
            job_description: jd.to_string(),
            job_title: None,
            company_name: None,
        }
    }

    #[test]
    fn test_validate_rejects_whitespace_resume() {
        let result = request("   \n\t", "Seeking Python engineer").validate();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_job_description() {
        let result = request("5 years Python backend", "").validate();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_keeps_required_text_verbatim() {
        let valid = request("  5 years Python backend  ", "Seeking Python engineer")
            .validate()
            .unwrap();
        assert_eq!(valid.resume_text(), "  5 years Python backend  ");
    }

    #[test]
    fn test_validate_drops_blank_optional_labels() {
        let mut req = request("resume", "jd");
        req.job_title = Some("   ".to_string());
        req.company_name = Some("  Acme  ".to_string());

        let valid = req.validate().unwrap();
        assert_eq!(valid.job_title(), None);
        assert_eq!(valid.company_name(), Some("Acme"));
    }

    #[test]
    fn test_request_deserializes_without_optional_fields() {
        let json = r#"{"resume_text": "r", "job_description": "j"}"#;
        let req: TailoringRequest = serde_json::from_str(json).unwrap();
        assert!(req.job_title.is_none());
        assert!(req.company_name.is_none());
    }

    #[test]
    fn test_result_rejects_duplicate_ids() {
        let bullets = vec![
            BulletPoint::new(1, "First", &["Rust"]),
            BulletPoint::new(1, "Second", &["Go"]),
        ];
        assert!(matches!(
            TailoringResult::new(bullets),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_result_dedups_keywords_within_bullet() {
        let result =
            TailoringResult::new(vec![BulletPoint::new(1, "text", &["AWS", "SQL", "AWS"])])
                .unwrap();
        assert_eq!(result.bullet_points()[0].keywords, vec!["AWS", "SQL"]);
    }

    #[test]
    fn test_all_keywords_first_seen_order() {
        let result = TailoringResult::new(vec![
            BulletPoint::new(1, "a", &["Python", "SQL"]),
            BulletPoint::new(2, "b", &["AWS", "Python"]),
        ])
        .unwrap();
        assert_eq!(result.all_keywords(), vec!["Python", "SQL", "AWS"]);
    }

    #[test]
    fn test_summary_uses_first_three_keywords() {
        let result = TailoringResult::new(vec![
            BulletPoint::new(1, "a", &["Python", "SQL"]),
            BulletPoint::new(2, "b", &["AWS", "Docker"]),
        ])
        .unwrap();
        assert_eq!(
            result.summary(),
            "Generated 2 tailored bullet points focusing on Python, SQL, AWS and other key skills."
        );
    }

    #[test]
    fn test_summary_with_fewer_keywords() {
        let result = TailoringResult::new(vec![BulletPoint::new(1, "a", &["Rust"])]).unwrap();
        assert_eq!(
            result.summary(),
            "Generated 1 tailored bullet points focusing on Rust and other key skills."
        );
    }

    #[test]
    fn test_export_text_joins_with_blank_line() {
        let output = TailoringResult::new(vec![
            BulletPoint::new(1, "Led teams", &[]),
            BulletPoint::new(2, "Shipped code", &[]),
        ])
        .unwrap()
        .into_output();
        assert_eq!(output.export_text(), "Led teams\n\nShipped code");
    }

    #[test]
    fn test_tailored_output_accepts_bullets_without_id() {
        let json = r#"{"bullet_points": [{"text": "Did X", "keywords": ["X"]}]}"#;
        let output: TailoredOutput = serde_json::from_str(json).unwrap();
        assert_eq!(output.bullet_points[0].id, 1);
        assert_eq!(output.bullet_points[0].keywords, vec!["X"]);
    }

    fn input(id: Option<u32>, text: &str) -> BulletInput {
        BulletInput {
            id,
            text: text.to_string(),
            keywords: vec![],
        }
    }

    #[test]
    fn test_from_inputs_numbers_unnumbered_bullets_by_position() {
        let result =
            TailoringResult::from_inputs(vec![input(None, "A"), input(None, "B"), input(None, "C")])
                .unwrap();
        let ids: Vec<u32> = result.bullet_points().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_from_inputs_numbers_after_explicit_ids() {
        let result =
            TailoringResult::from_inputs(vec![input(None, "A"), input(Some(2), "B"), input(None, "C")])
                .unwrap();
        let ids: Vec<u32> = result.bullet_points().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 2, 4]);
    }

    #[test]
    fn test_from_inputs_still_rejects_repeated_explicit_ids() {
        let result =
            TailoringResult::from_inputs(vec![input(Some(1), "A"), input(Some(1), "B")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
