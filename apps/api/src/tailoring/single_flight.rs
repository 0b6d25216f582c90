use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::AppError;
use crate::session::CallerId;

/// Tracks which callers have a tailoring call in flight. At most one per caller.
#[derive(Default)]
pub struct InflightRegistry {
    active: Mutex<HashSet<CallerId>>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the caller's slot, or fails with `Conflict` if it is taken.
    /// The slot is released when the guard drops, including on cancellation.
    pub fn try_acquire(self: &Arc<Self>, caller: CallerId) -> Result<InflightGuard, AppError> {
        if !self.lock().insert(caller) {
            return Err(AppError::Conflict(
                "A tailoring request is already in progress".to_string(),
            ));
        }
        Ok(InflightGuard {
            registry: Arc::clone(self),
            caller,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<CallerId>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct InflightGuard {
    registry: Arc<InflightRegistry>,
    caller: CallerId,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.caller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_second_acquire_conflicts_until_release() {
        let registry = Arc::new(InflightRegistry::new());
        let caller = CallerId(Uuid::new_v4());

        let guard = registry.try_acquire(caller).unwrap();
        assert!(matches!(
            registry.try_acquire(caller),
            Err(AppError::Conflict(_))
        ));

        drop(guard);
        assert!(registry.try_acquire(caller).is_ok());
    }

    #[test]
    fn test_callers_are_independent() {
        let registry = Arc::new(InflightRegistry::new());
        let _a = registry.try_acquire(CallerId(Uuid::new_v4())).unwrap();
        assert!(registry.try_acquire(CallerId(Uuid::new_v4())).is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_task_releases_slot() {
        let registry = Arc::new(InflightRegistry::new());
        let caller = CallerId(Uuid::new_v4());

        let held = Arc::clone(&registry);
        let task = tokio::spawn(async move {
            let _guard = held.try_acquire(caller).unwrap();
            std::future::pending::<()>().await;
        });
        tokio::task::yield_now().await;
        while registry.lock().is_empty() {
            tokio::task::yield_now().await;
        }

        task.abort();
        let _ = task.await;
        assert!(registry.try_acquire(caller).is_ok());
    }
}
