//! History store client: the CRUD facade the rest of the service talks to.
//!
//! Every operation is one store round trip. Writes never touch the cached list
//! directly: they invalidate it, and the next `list()` refetches in full.
//! Store failures are logged and translated here; callers only see `AppError`.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::cache::ListCache;
use crate::history::store::{HistoryStore, StoreError};
use crate::models::history::{HistoryDraft, HistoryPatch, HistoryRecord};
use crate::session::{CallerId, SessionGate};

/// Proof that the caller explicitly confirmed an irreversible delete.
#[derive(Debug, Clone, Copy)]
pub struct DeleteConfirmation {
    id: Uuid,
}

impl DeleteConfirmation {
    pub fn confirm(id: Uuid) -> Self {
        Self { id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

pub struct HistoryClient {
    store: Arc<dyn HistoryStore>,
    cache: ListCache,
}

impl HistoryClient {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self::with_cache(store, ListCache::default())
    }

    pub fn with_cache(store: Arc<dyn HistoryStore>, cache: ListCache) -> Self {
        Self { store, cache }
    }

    /// The caller's records, newest first. Served from cache when warm.
    pub async fn list(&self, session: &dyn SessionGate) -> Result<Vec<HistoryRecord>, AppError> {
        let owner = require_caller(session)?;

        if let Some(records) = self.cache.cached(owner) {
            return Ok(records.as_ref().clone());
        }

        let records = self
            .cache
            .refetch(owner, self.store.as_ref())
            .await
            .map_err(|e| fetch_error("list tailored resumes", e))?;
        debug!(
            "Refetched history for user {} ({} callers cached)",
            owner,
            self.cache.cached_callers()
        );
        Ok(records.as_ref().clone())
    }

    /// Persists a draft owned by the session's caller.
    ///
    /// Order: session check, validation, write, invalidate. Nothing is written
    /// without a session.
    pub async fn create(
        &self,
        session: &dyn SessionGate,
        draft: &HistoryDraft,
    ) -> Result<HistoryRecord, AppError> {
        let owner = require_caller(session)?;
        draft.validate()?;

        let record = self
            .store
            .insert(owner, draft)
            .await
            .map_err(|e| fetch_error("save tailored resume", e))?;
        self.cache.invalidate(owner);

        info!("Saved tailored resume {} for user {}", record.id, owner);
        Ok(record)
    }

    pub async fn get_by_id(
        &self,
        session: &dyn SessionGate,
        id: Uuid,
    ) -> Result<HistoryRecord, AppError> {
        let owner = require_caller(session)?;

        self.store
            .select_by_id(owner, id)
            .await
            .map_err(|e| fetch_error("load tailored resume", e))?
            .ok_or_else(|| not_found(id))
    }

    pub async fn update(
        &self,
        session: &dyn SessionGate,
        id: Uuid,
        patch: &HistoryPatch,
    ) -> Result<HistoryRecord, AppError> {
        let owner = require_caller(session)?;
        patch.validate()?;

        let record = self
            .store
            .update_by_id(owner, id, patch)
            .await
            .map_err(|e| fetch_error("update tailored resume", e))?
            .ok_or_else(|| not_found(id))?;
        self.cache.invalidate(owner);

        info!("Updated tailored resume {} for user {}", id, owner);
        Ok(record)
    }

    /// Permanently removes a record. There is no soft delete.
    pub async fn delete(
        &self,
        session: &dyn SessionGate,
        confirmation: DeleteConfirmation,
    ) -> Result<(), AppError> {
        let owner = require_caller(session)?;
        let id = confirmation.id();

        let deleted = self
            .store
            .delete_by_id(owner, id)
            .await
            .map_err(|e| fetch_error("delete tailored resume", e))?;
        if !deleted {
            return Err(not_found(id));
        }
        self.cache.invalidate(owner);

        info!("Deleted tailored resume {} for user {}", id, owner);
        Ok(())
    }
}

fn require_caller(session: &dyn SessionGate) -> Result<CallerId, AppError> {
    session.current_caller_id().ok_or(AppError::AuthRequired)
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Tailored resume {id} not found"))
}

fn fetch_error(operation: &str, e: StoreError) -> AppError {
    error!("Failed to {operation}: {e}");
    AppError::Fetch(format!("Failed to {operation}. Please try again."))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::history::memory::MemoryHistoryStore;
    use crate::models::tailoring::{BulletPoint, TailoredOutput};
    use crate::session::CallerSession;

    /// Memory store that counts calls and can be switched into failure mode.
    #[derive(Default)]
    struct SpyStore {
        inner: MemoryHistoryStore,
        inserts: AtomicUsize,
        selects: AtomicUsize,
        failing: std::sync::atomic::AtomicBool,
    }

    impl SpyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl HistoryStore for SpyStore {
        async fn insert(
            &self,
            owner: CallerId,
            draft: &HistoryDraft,
        ) -> Result<HistoryRecord, StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.inner.insert(owner, draft).await
        }

        async fn select_owned(&self, owner: CallerId) -> Result<Vec<HistoryRecord>, StoreError> {
            self.selects.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.inner.select_owned(owner).await
        }

        async fn select_by_id(
            &self,
            owner: CallerId,
            id: Uuid,
        ) -> Result<Option<HistoryRecord>, StoreError> {
            self.check()?;
            self.inner.select_by_id(owner, id).await
        }

        async fn delete_by_id(&self, owner: CallerId, id: Uuid) -> Result<bool, StoreError> {
            self.check()?;
            self.inner.delete_by_id(owner, id).await
        }

        async fn update_by_id(
            &self,
            owner: CallerId,
            id: Uuid,
            patch: &HistoryPatch,
        ) -> Result<Option<HistoryRecord>, StoreError> {
            self.check()?;
            self.inner.update_by_id(owner, id, patch).await
        }
    }

    fn setup() -> (Arc<SpyStore>, HistoryClient) {
        let store = Arc::new(SpyStore::default());
        let client = HistoryClient::new(store.clone());
        (store, client)
    }

    fn signed_in() -> CallerSession {
        CallerSession::authenticated(CallerId(Uuid::new_v4()))
    }

    fn draft(title: &str) -> HistoryDraft {
        HistoryDraft {
            job_title: Some(title.to_string()),
            company_name: Some("Acme".to_string()),
            resume_text: "5 years Python backend".to_string(),
            job_description: "Seeking Python engineer with AWS experience".to_string(),
            tailored_output: TailoredOutput {
                bullet_points: vec![BulletPoint::new(1, "Built APIs in Python", &["Python"])],
            },
            tailored_summary: None,
            keywords: Some(vec!["Python".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_create_without_session_never_writes() {
        let (store, client) = setup();

        let result = client.create(&CallerSession::anonymous(), &draft("x")).await;

        assert!(matches!(result, Err(AppError::AuthRequired)));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_without_session_fails() {
        let (store, client) = setup();
        let result = client.list(&CallerSession::anonymous()).await;
        assert!(matches!(result, Err(AppError::AuthRequired)));
        assert_eq!(store.selects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_then_list_puts_new_record_first_with_session_owner() {
        let (_, client) = setup();
        let session = signed_in();

        client.create(&session, &draft("older")).await.unwrap();
        let created = client.create(&session, &draft("newer")).await.unwrap();

        let listed = client.list(&session).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(
            listed[0].owner_id,
            session.current_caller_id().map(|c| c.0)
        );
    }

    #[tokio::test]
    async fn test_list_is_cached_until_a_write_invalidates_it() {
        let (store, client) = setup();
        let session = signed_in();

        client.list(&session).await.unwrap();
        client.list(&session).await.unwrap();
        assert_eq!(store.selects.load(Ordering::SeqCst), 1);

        client.create(&session, &draft("new")).await.unwrap();
        let listed = client.list(&session).await.unwrap();
        assert_eq!(store.selects.load(Ordering::SeqCst), 2);
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let (_, client) = setup();
        assert!(client.list(&signed_in()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_from_list_and_get() {
        let (_, client) = setup();
        let session = signed_in();
        let record = client.create(&session, &draft("gone")).await.unwrap();
        client.list(&session).await.unwrap();

        client
            .delete(&session, DeleteConfirmation::confirm(record.id))
            .await
            .unwrap();

        let listed = client.list(&session).await.unwrap();
        assert!(listed.iter().all(|r| r.id != record.id));
        assert!(matches!(
            client.get_by_id(&session, record.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let (_, client) = setup();
        let result = client
            .delete(&signed_in(), DeleteConfirmation::confirm(Uuid::new_v4()))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_without_session_is_auth_error() {
        let (_, client) = setup();
        let result = client
            .delete(
                &CallerSession::anonymous(),
                DeleteConfirmation::confirm(Uuid::new_v4()),
            )
            .await;
        assert!(matches!(result, Err(AppError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_other_callers_records_are_invisible() {
        let (_, client) = setup();
        let alice = signed_in();
        let bob = signed_in();
        let record = client.create(&alice, &draft("private")).await.unwrap();

        assert!(client.list(&bob).await.unwrap().is_empty());
        assert!(matches!(
            client.get_by_id(&bob, record.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_invalidates_cached_list() {
        let (_, client) = setup();
        let session = signed_in();
        let record = client.create(&session, &draft("before")).await.unwrap();
        client.list(&session).await.unwrap();

        let patch = HistoryPatch {
            job_title: Some("after".to_string()),
            ..Default::default()
        };
        client.update(&session, record.id, &patch).await.unwrap();

        let listed = client.list(&session).await.unwrap();
        assert_eq!(listed[0].job_title.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_fetch_error() {
        let (store, client) = setup();
        store.failing.store(true, Ordering::SeqCst);

        let result = client.list(&signed_in()).await;
        match result {
            Err(AppError::Fetch(msg)) => assert!(!msg.contains("pool")),
            other => panic!("expected Fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_create_leaves_cache_intact() {
        let (store, client) = setup();
        let session = signed_in();
        client.list(&session).await.unwrap();

        store.failing.store(true, Ordering::SeqCst);
        assert!(matches!(
            client.create(&session, &draft("x")).await,
            Err(AppError::Fetch(_))
        ));

        store.failing.store(false, Ordering::SeqCst);
        client.list(&session).await.unwrap();
        assert_eq!(store.selects.load(Ordering::SeqCst), 1);
    }
}
