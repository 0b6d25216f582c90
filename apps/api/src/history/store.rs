//! Persistence boundary for tailoring history.
//!
//! `HistoryStore` is the seam: the client only depends on these operations, never
//! on SQL. Every operation is scoped to one owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::history::{HistoryDraft, HistoryPatch, HistoryRecord};
use crate::models::tailoring::TailoredOutput;
use crate::session::CallerId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Inserts a row owned by `owner`; the store assigns id and timestamps.
    async fn insert(&self, owner: CallerId, draft: &HistoryDraft)
        -> Result<HistoryRecord, StoreError>;

    /// All rows owned by `owner`, newest first.
    async fn select_owned(&self, owner: CallerId) -> Result<Vec<HistoryRecord>, StoreError>;

    async fn select_by_id(
        &self,
        owner: CallerId,
        id: Uuid,
    ) -> Result<Option<HistoryRecord>, StoreError>;

    /// Returns `false` when no owned row matched.
    async fn delete_by_id(&self, owner: CallerId, id: Uuid) -> Result<bool, StoreError>;

    async fn update_by_id(
        &self,
        owner: CallerId,
        id: Uuid,
        patch: &HistoryPatch,
    ) -> Result<Option<HistoryRecord>, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
struct TailoredResumeRow {
    id: Uuid,
    user_id: Option<Uuid>,
    job_title: Option<String>,
    company_name: Option<String>,
    resume_text: String,
    job_description: String,
    tailored_output: Json<TailoredOutput>,
    tailored_summary: Option<String>,
    keywords: Option<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TailoredResumeRow> for HistoryRecord {
    fn from(row: TailoredResumeRow) -> Self {
        HistoryRecord {
            id: row.id,
            owner_id: row.user_id,
            job_title: row.job_title,
            company_name: row.company_name,
            resume_text: row.resume_text,
            job_description: row.job_description,
            tailored_output: row.tailored_output.0,
            tailored_summary: row.tailored_summary,
            keywords: row.keywords,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, user_id, job_title, company_name, resume_text, job_description, \
     tailored_output, tailored_summary, keywords, created_at, updated_at";

/// `tailored_resumes` table in PostgreSQL. See `migrations/0001_tailored_resumes.sql`.
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn insert(
        &self,
        owner: CallerId,
        draft: &HistoryDraft,
    ) -> Result<HistoryRecord, StoreError> {
        let row = sqlx::query_as::<_, TailoredResumeRow>(&format!(
            r#"
            INSERT INTO tailored_resumes
                (user_id, job_title, company_name, resume_text, job_description,
                 tailored_output, tailored_summary, keywords)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(owner.0)
        .bind(&draft.job_title)
        .bind(&draft.company_name)
        .bind(&draft.resume_text)
        .bind(&draft.job_description)
        .bind(Json(&draft.tailored_output))
        .bind(&draft.tailored_summary)
        .bind(&draft.keywords)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn select_owned(&self, owner: CallerId) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = sqlx::query_as::<_, TailoredResumeRow>(&format!(
            "SELECT {COLUMNS} FROM tailored_resumes WHERE user_id = $1 \
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(owner.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryRecord::from).collect())
    }

    async fn select_by_id(
        &self,
        owner: CallerId,
        id: Uuid,
    ) -> Result<Option<HistoryRecord>, StoreError> {
        let row = sqlx::query_as::<_, TailoredResumeRow>(&format!(
            "SELECT {COLUMNS} FROM tailored_resumes WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(HistoryRecord::from))
    }

    async fn delete_by_id(&self, owner: CallerId, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tailored_resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_by_id(
        &self,
        owner: CallerId,
        id: Uuid,
        patch: &HistoryPatch,
    ) -> Result<Option<HistoryRecord>, StoreError> {
        let row = sqlx::query_as::<_, TailoredResumeRow>(&format!(
            r#"
            UPDATE tailored_resumes SET
                job_title        = COALESCE($3, job_title),
                company_name     = COALESCE($4, company_name),
                resume_text      = COALESCE($5, resume_text),
                job_description  = COALESCE($6, job_description),
                tailored_output  = COALESCE($7, tailored_output),
                tailored_summary = COALESCE($8, tailored_summary),
                keywords         = COALESCE($9, keywords),
                updated_at       = GREATEST(now(), updated_at)
            WHERE id = $1 AND user_id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner.0)
        .bind(&patch.job_title)
        .bind(&patch.company_name)
        .bind(&patch.resume_text)
        .bind(&patch.job_description)
        .bind(patch.output.as_ref().map(|o| Json(&o.tailored_output)))
        .bind(patch.output.as_ref().map(|o| &o.tailored_summary))
        .bind(patch.output.as_ref().map(|o| &o.keywords))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(HistoryRecord::from))
    }
}
