//! # Persisted config record and targeted updates.
//!
//! [`StoredConfig`] is the whole durable record. Contexts never rewrite it
//! from their in-memory view; they send [`ConfigPatch`]es that each touch one
//! field, so two racing leaders only clobber the field they both wrote.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{ActionId, NotificationChannels};

fn enabled() -> bool {
    true
}

/// Durable config shared by all contexts of one origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    /// Monitored targets in insertion order.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Last processed action id per target.
    #[serde(default)]
    pub cursors: BTreeMap<String, ActionId>,
    /// Overlay notifications enabled.
    #[serde(default = "enabled")]
    pub notify_overlay: bool,
    /// System notifications enabled.
    #[serde(default = "enabled")]
    pub notify_system: bool,
    /// Targets hidden from the feed.
    #[serde(default)]
    pub hidden: BTreeSet<String>,
}

impl StoredConfig {
    /// Both notification flags.
    pub fn channels(&self) -> NotificationChannels {
        NotificationChannels {
            overlay: self.notify_overlay,
            system: self.notify_system,
        }
    }
}

impl Default for StoredConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            cursors: BTreeMap::new(),
            notify_overlay: true,
            notify_system: true,
            hidden: BTreeSet::new(),
        }
    }
}

/// A targeted update of one field of [`StoredConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigPatch {
    /// Replace the monitored list.
    Targets(Vec<String>),
    /// Set one target's cursor.
    Cursor {
        /// Target id.
        target: String,
        /// New cursor.
        cursor: ActionId,
    },
    /// Forget one target's cursor.
    DropCursor {
        /// Target id.
        target: String,
    },
    /// Replace both notification flags.
    Channels(NotificationChannels),
    /// Replace the hidden set.
    Hidden(BTreeSet<String>),
}

impl ConfigPatch {
    /// Applies this patch to `config`.
    pub fn apply(&self, config: &mut StoredConfig) {
        match self {
            ConfigPatch::Targets(list) => config.targets = list.clone(),
            ConfigPatch::Cursor { target, cursor } => {
                config.cursors.insert(target.clone(), cursor.clone());
            }
            ConfigPatch::DropCursor { target } => {
                config.cursors.remove(target);
            }
            ConfigPatch::Channels(ch) => {
                config.notify_overlay = ch.overlay;
                config.notify_system = ch.system;
            }
            ConfigPatch::Hidden(set) => config.hidden = set.clone(),
        }
    }

    /// True if `newer` makes this patch redundant.
    pub(crate) fn superseded_by(&self, newer: &ConfigPatch) -> bool {
        match (self, newer) {
            (ConfigPatch::Targets(_), ConfigPatch::Targets(_))
            | (ConfigPatch::Channels(_), ConfigPatch::Channels(_))
            | (ConfigPatch::Hidden(_), ConfigPatch::Hidden(_)) => true,
            (
                ConfigPatch::Cursor { target: a, .. } | ConfigPatch::DropCursor { target: a },
                ConfigPatch::Cursor { target: b, .. } | ConfigPatch::DropCursor { target: b },
            ) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flags_default_to_enabled() {
        let cfg: StoredConfig = serde_json::from_str(r#"{"targets":["alice"]}"#).unwrap();
        assert_eq!(cfg.targets, vec!["alice".to_string()]);
        assert!(cfg.notify_overlay && cfg.notify_system);
        assert!(cfg.cursors.is_empty());
    }

    #[test]
    fn test_patches_touch_one_field() {
        let mut cfg = StoredConfig::default();
        ConfigPatch::Targets(vec!["alice".into(), "bob".into()]).apply(&mut cfg);
        ConfigPatch::Cursor { target: "alice".into(), cursor: ActionId::new("a5") }.apply(&mut cfg);
        ConfigPatch::Channels(NotificationChannels { overlay: false, system: true }).apply(&mut cfg);

        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.cursors.get("alice"), Some(&ActionId::new("a5")));
        assert!(!cfg.notify_overlay);
        assert!(cfg.notify_system);

        ConfigPatch::DropCursor { target: "alice".into() }.apply(&mut cfg);
        assert!(cfg.cursors.is_empty());
        assert_eq!(cfg.targets.len(), 2);
    }

    #[test]
    fn test_superseded() {
        let a1 = ConfigPatch::Cursor { target: "alice".into(), cursor: ActionId::new("a1") };
        let a2 = ConfigPatch::DropCursor { target: "alice".into() };
        let b1 = ConfigPatch::Cursor { target: "bob".into(), cursor: ActionId::new("b1") };
        assert!(a1.superseded_by(&a2));
        assert!(!a1.superseded_by(&b1));
        assert!(ConfigPatch::Targets(vec![]).superseded_by(&ConfigPatch::Targets(vec!["x".into()])));
    }
}
