//! In-process history store, used when no database is configured and by tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::history::store::{HistoryStore, StoreError};
use crate::models::history::{HistoryDraft, HistoryPatch, HistoryRecord};
use crate::session::CallerId;

#[derive(Default)]
pub struct MemoryHistoryStore {
    // Insertion order; newest last.
    rows: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert(
        &self,
        owner: CallerId,
        draft: &HistoryDraft,
    ) -> Result<HistoryRecord, StoreError> {
        let mut rows = self.rows.lock().await;

        // Clock skew must not make a newer row sort below an older one.
        let now = Utc::now();
        let created_at = rows
            .last()
            .map(|last| last.created_at.max(now))
            .unwrap_or(now);

        let record = HistoryRecord {
            id: Uuid::new_v4(),
            owner_id: Some(owner.0),
            job_title: draft.job_title.clone(),
            company_name: draft.company_name.clone(),
            resume_text: draft.resume_text.clone(),
            job_description: draft.job_description.clone(),
            tailored_output: draft.tailored_output.clone(),
            tailored_summary: draft.tailored_summary.clone(),
            keywords: draft.keywords.clone(),
            created_at,
            updated_at: created_at,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn select_owned(&self, owner: CallerId) -> Result<Vec<HistoryRecord>, StoreError> {
        let rows = self.rows.lock().await;
        // Reverse insertion order is newest first, ties included.
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.owner_id == Some(owner.0))
            .cloned()
            .collect())
    }

    async fn select_by_id(
        &self,
        owner: CallerId,
        id: Uuid,
    ) -> Result<Option<HistoryRecord>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .find(|r| r.id == id && r.owner_id == Some(owner.0))
            .cloned())
    }

    async fn delete_by_id(&self, owner: CallerId, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.owner_id == Some(owner.0)));
        Ok(rows.len() < before)
    }

    async fn update_by_id(
        &self,
        owner: CallerId,
        id: Uuid,
        patch: &HistoryPatch,
    ) -> Result<Option<HistoryRecord>, StoreError> {
        let mut rows = self.rows.lock().await;
        let Some(record) = rows
            .iter_mut()
            .find(|r| r.id == id && r.owner_id == Some(owner.0))
        else {
            return Ok(None);
        };

        patch.apply_to(record);
        record.updated_at = record.updated_at.max(Utc::now());
        Ok(Some(record.clone()))
    }
}
