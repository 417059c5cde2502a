use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ConfigStore, StoredConfig};
use crate::error::StoreError;

/// In-process store; shared by reference between contexts like browser storage.
///
/// `set_failing(true)` makes every read and write fail with
/// [`StoreError::Unavailable`] until switched back.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<StoredConfig>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `config`.
    pub fn with_config(config: StoredConfig) -> Self {
        Self {
            record: Mutex::new(config),
            ..Self::default()
        }
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> StoredConfig {
        self.record.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Toggles simulated failures.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                error: "memory store set to fail".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load(&self) -> Result<StoredConfig, StoreError> {
        self.check()?;
        self.record
            .lock()
            .map(|r| r.clone())
            .map_err(|e| StoreError::Unavailable { error: e.to_string() })
    }

    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError> {
        self.check()?;
        let mut record = self
            .record
            .lock()
            .map_err(|e| StoreError::Unavailable { error: e.to_string() })?;
        *record = config.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConfigPatch;

    #[tokio::test]
    async fn test_patch_round_trips_through_load() {
        let store = MemoryStore::new();
        store.patch(&[ConfigPatch::Targets(vec!["alice".into()])]).await.unwrap();
        assert_eq!(store.load().await.unwrap().targets, vec!["alice".to_string()]);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_store_rejects_writes() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let err = store.patch(&[ConfigPatch::Targets(vec!["alice".into()])]).await.unwrap_err();
        assert_eq!(err.as_label(), "store_unavailable");

        store.set_failing(false);
        assert!(store.snapshot().targets.is_empty());
        assert_eq!(store.save_count(), 0);
    }
}
