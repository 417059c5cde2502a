use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{ConfigStore, StoredConfig};
use crate::error::StoreError;

/// Store backed by one JSON file.
///
/// A missing file reads as the default record. Writes go to a sibling
/// `*.tmp` file which is then renamed over the target.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    async fn load(&self) -> Result<StoredConfig, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored config yet");
                Ok(StoredConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, config: &StoredConfig) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(config)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActionId;
    use crate::store::ConfigPatch;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("seek.json"));
        assert_eq!(store.load().await.unwrap(), StoredConfig::default());
    }

    #[tokio::test]
    async fn test_patch_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("seek.json");

        let store = JsonFileStore::new(&path);
        store
            .patch(&[
                ConfigPatch::Targets(vec!["alice".into()]),
                ConfigPatch::Cursor { target: "alice".into(), cursor: ActionId::new("a5") },
            ])
            .await
            .unwrap();

        let reopened = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(reopened.targets, vec!["alice".to_string()]);
        assert_eq!(reopened.cursors.get("alice"), Some(&ActionId::new("a5")));
        assert!(!path.with_file_name("seek.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seek.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert_eq!(err.as_label(), "store_decode");
    }
}
