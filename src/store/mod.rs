//! # Persistent config store and settings collaborator.
//!
//! The store is the only durable resource shared between contexts. Only the
//! context that believes it leads writes to it, and only through targeted
//! [`ConfigPatch`]es.
//!
//! ## Contents
//! - [`ConfigStore`]      seam: `load`, `save`, and a provided `patch`
//! - [`StoredConfig`]     the durable record
//! - [`MemoryStore`]      in-process store (tests, single-process hosts)
//! - [`JsonFileStore`]    one JSON file on disk
//! - [`Settings`], [`StaticSettings`] source of the monitored list at startup

mod file;
mod memory;
mod record;
mod settings;

use async_trait::async_trait;

use crate::error::StoreError;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use record::{ConfigPatch, StoredConfig};
pub use settings::{Settings, SettingsSnapshot, StaticSettings};

/// Durable key-value record shared by all contexts.
///
/// There is no lock: a write races with any concurrent write and the last one
/// wins. Cursors lost that way are re-derived by the next successful poll.
#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    /// Reads the whole record (a missing record reads as default).
    async fn load(&self) -> Result<StoredConfig, StoreError>;

    /// Replaces the whole record.
    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError>;

    /// Read-modify-write of the fields touched by `patches`.
    async fn patch(&self, patches: &[ConfigPatch]) -> Result<(), StoreError> {
        let mut config = self.load().await?;
        for p in patches {
            p.apply(&mut config);
        }
        self.save(&config).await
    }
}
