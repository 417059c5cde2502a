use serde::{Deserialize, Serialize};

use crate::transport::ConfigKey;

/// Enable flags of the two notification channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannels {
    /// In-page overlay toast.
    pub overlay: bool,
    /// Operating-system notification.
    pub system: bool,
}

impl NotificationChannels {
    /// True if at least one channel is enabled.
    pub fn any(&self) -> bool {
        self.overlay || self.system
    }

    /// Reads one flag.
    pub fn get(&self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::NotifyOverlay => self.overlay,
            ConfigKey::NotifySystem => self.system,
        }
    }

    /// Writes one flag; returns whether it changed.
    pub fn set(&mut self, key: ConfigKey, value: bool) -> bool {
        let slot = match key {
            ConfigKey::NotifyOverlay => &mut self.overlay,
            ConfigKey::NotifySystem => &mut self.system,
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }
}

impl Default for NotificationChannels {
    fn default() -> Self {
        Self {
            overlay: true,
            system: true,
        }
    }
}
