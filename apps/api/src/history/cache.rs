use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::history::store::{HistoryStore, StoreError};
use crate::models::history::HistoryRecord;
use crate::session::CallerId;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Per-caller cache of the last `list()` result.
///
/// Only `invalidate` and `refetch` add or drop entries. Entries expire after `ttl`,
/// which also bounds how long a write made outside this process stays invisible,
/// and at most `max_entries` callers are held at once (oldest fetch evicted first).
///
/// A single generation counter is bumped by every `invalidate`; a refetch that
/// started before any invalidation finishes without storing, so stale data never
/// lands after a write.
pub struct ListCache {
    inner: Mutex<Inner>,
    ttl: Duration,
    max_entries: usize,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    entries: HashMap<CallerId, Entry>,
}

struct Entry {
    records: Arc<Vec<HistoryRecord>>,
    fetched_at: Instant,
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl ListCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            max_entries,
        }
    }

    pub fn cached(&self, owner: CallerId) -> Option<Arc<Vec<HistoryRecord>>> {
        let mut inner = self.lock();
        let fresh = inner
            .entries
            .get(&owner)
            .map(|entry| entry.fetched_at.elapsed() < self.ttl)?;
        if !fresh {
            inner.entries.remove(&owner);
            return None;
        }
        inner.entries.get(&owner).map(|entry| Arc::clone(&entry.records))
    }

    pub fn invalidate(&self, owner: CallerId) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.entries.remove(&owner);
    }

    /// Fetches the owner's full list from the store and caches it.
    pub async fn refetch(
        &self,
        owner: CallerId,
        store: &dyn HistoryStore,
    ) -> Result<Arc<Vec<HistoryRecord>>, StoreError> {
        let started_at = self.lock().generation;
        let records = Arc::new(store.select_owned(owner).await?);

        let mut inner = self.lock();
        if inner.generation == started_at {
            self.make_room(&mut inner, owner);
            if inner.entries.len() < self.max_entries {
                inner.entries.insert(
                    owner,
                    Entry {
                        records: Arc::clone(&records),
                        fetched_at: Instant::now(),
                    },
                );
            }
        }
        Ok(records)
    }

    /// Number of callers currently cached, expired entries included.
    pub fn cached_callers(&self) -> usize {
        self.lock().entries.len()
    }

    /// Drops expired entries, then the oldest ones, until `owner` fits.
    fn make_room(&self, inner: &mut Inner, owner: CallerId) {
        inner.entries.remove(&owner);
        let ttl = self.ttl;
        inner
            .entries
            .retain(|_, entry| entry.fetched_at.elapsed() < ttl);

        while !inner.entries.is_empty() && inner.entries.len() >= self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(caller, _)| *caller);
            match oldest {
                Some(caller) => {
                    inner.entries.remove(&caller);
                }
                None => break,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
