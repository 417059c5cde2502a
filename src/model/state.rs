//! # Aggregate state exchanged between contexts.
//!
//! [`AggregateState`] is the full view a leader holds: the ordered target list
//! (with cursors, multipliers, next poll times and profiles), the latest page
//! of actions per target, and the hidden set. It is the only payload of
//! `data_update` and is sufficient for a follower to rebuild its view.
//!
//! ## Merge rules
//! - Followers [`adopt`](AggregateState::adopt) a broadcast wholesale, then fold
//!   their own hidden set back in (visibility is per-context UI state).
//! - A leader never adopts; it only [`fill_gaps`](AggregateState::fill_gaps)
//!   from a demoted leader's broadcast so it isn't starved of history.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::action::{Action, ActionId};
use super::target::Target;

/// Full leader-held view of all monitored targets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateState {
    /// Monitored targets in insertion order (order decides tick priority).
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Latest fetched page per target, newest first.
    #[serde(default)]
    pub actions: BTreeMap<String, Vec<Action>>,
    /// Targets whose actions are hidden from the feed.
    #[serde(default)]
    pub hidden: BTreeSet<String>,
}

impl AggregateState {
    /// Returns the target with `id`.
    pub fn target(&self, id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Returns the target with `id` mutably.
    pub fn target_mut(&mut self, id: &str) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| t.id == id)
    }

    /// True if `id` is monitored.
    pub fn contains(&self, id: &str) -> bool {
        self.target(id).is_some()
    }

    /// Ordered list of monitored ids.
    pub fn target_ids(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.id.clone()).collect()
    }

    /// Cursor map of all targets that have one.
    pub fn cursors(&self) -> BTreeMap<String, ActionId> {
        self.targets
            .iter()
            .filter_map(|t| t.cursor.clone().map(|c| (t.id.clone(), c)))
            .collect()
    }

    /// True if a page of actions is cached for `id`.
    pub fn has_actions(&self, id: &str) -> bool {
        self.actions.get(id).is_some_and(|page| !page.is_empty())
    }

    /// Appends `target` unless one with the same id exists; returns whether it was added.
    pub fn insert_target(&mut self, target: Target) -> bool {
        if self.contains(&target.id) {
            return false;
        }
        self.targets.push(target);
        true
    }

    /// Removes `id` together with its cursor, multiplier and cached actions.
    pub fn remove_target(&mut self, id: &str) -> Option<Target> {
        let idx = self.targets.iter().position(|t| t.id == id)?;
        self.actions.remove(id);
        self.hidden.remove(id);
        Some(self.targets.remove(idx))
    }

    /// Toggles visibility of `id`; returns `true` if it is now hidden.
    pub fn toggle_hidden(&mut self, id: &str) -> bool {
        if self.hidden.remove(id) {
            false
        } else {
            self.hidden.insert(id.to_string());
            true
        }
    }

    /// Replaces this view with `incoming`, keeping the local hidden set.
    pub fn adopt(&mut self, incoming: AggregateState) {
        let hidden = std::mem::take(&mut self.hidden);
        *self = incoming;
        self.hidden = hidden;
    }

    /// Copies history this view lacks from `other`, never overwriting.
    ///
    /// Only targets that are monitored here are considered: cursors are filled
    /// where missing, and pages where none is cached. Returns whether anything changed.
    pub fn fill_gaps(&mut self, other: &AggregateState) -> bool {
        let mut changed = false;
        for target in &mut self.targets {
            let Some(theirs) = other.target(&target.id) else {
                continue;
            };
            if target.cursor.is_none() && theirs.cursor.is_some() {
                target.cursor = theirs.cursor.clone();
                changed = true;
            }
            if target.profile.is_none() && theirs.profile.is_some() {
                target.profile = theirs.profile.clone();
                changed = true;
            }
            let missing = self.actions.get(&target.id).is_none_or(|page| page.is_empty());
            if missing {
                if let Some(page) = other.actions.get(&target.id).filter(|p| !p.is_empty()) {
                    self.actions.insert(target.id.clone(), page.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Actions of all visible targets merged newest-first.
    ///
    /// Actions without a creation time sort last.
    pub fn feed(&self) -> Vec<&Action> {
        let mut all: Vec<&Action> = self
            .actions
            .iter()
            .filter(|(id, _)| !self.hidden.contains(*id))
            .flat_map(|(_, page)| page.iter())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}
