use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SettingsError;
use crate::model::NotificationChannels;

/// What the settings collaborator says the user wants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    /// Accounts to monitor.
    pub targets: Vec<String>,
    /// Notification flags, when the settings source manages them.
    pub channels: Option<NotificationChannels>,
}

/// Settings collaborator: read at boot and on `reload_settings`.
#[async_trait]
pub trait Settings: Send + Sync + 'static {
    /// Current settings.
    async fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError>;
}

/// Settings held in memory; `set` replaces them for the next query.
#[derive(Debug, Default)]
pub struct StaticSettings {
    inner: Mutex<SettingsSnapshot>,
}

impl StaticSettings {
    /// Settings monitoring `targets` with store-managed channels.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Mutex::new(SettingsSnapshot {
                targets: targets.into_iter().map(Into::into).collect(),
                channels: None,
            }),
        }
    }

    /// Replaces the snapshot.
    pub fn set(&self, snapshot: SettingsSnapshot) {
        if let Ok(mut inner) = self.inner.lock() {
            *inner = snapshot;
        }
    }
}

#[async_trait]
impl Settings for StaticSettings {
    async fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError> {
        self.inner
            .lock()
            .map(|s| s.clone())
            .map_err(|e| SettingsError::Unavailable { error: e.to_string() })
    }
}
