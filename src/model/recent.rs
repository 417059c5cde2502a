//! # Bounded FIFO of delivered action ids.
//!
//! [`RecentlySeenSet`] suppresses a second notification for an action that
//! surfaces through more than one path (two fetches, a leader's delivery and a
//! re-broadcast, two leaders during a race).
//!
//! ## Rules
//! - Insertion order is kept; re-inserting a member does **not** refresh it.
//! - Exceeding the capacity evicts the oldest member.
//! - Capacity is clamped to a minimum of 1.

use std::collections::{HashSet, VecDeque};

use super::action::ActionId;

/// Bounded set of recently delivered [`ActionId`]s.
#[derive(Clone, Debug)]
pub struct RecentlySeenSet {
    capacity: usize,
    order: VecDeque<ActionId>,
    members: HashSet<ActionId>,
}

impl RecentlySeenSet {
    /// Creates an empty set holding at most `capacity` ids.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
        }
    }

    /// Records `id`; returns `true` if it was not present (i.e. should be delivered).
    pub fn insert(&mut self, id: ActionId) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        true
    }

    /// True if `id` is currently remembered.
    pub fn contains(&self, id: &ActionId) -> bool {
        self.members.contains(id)
    }

    /// Number of remembered ids.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of remembered ids.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ActionId {
        ActionId::new(format!("a{n}"))
    }

    #[test]
    fn test_overflow_keeps_most_recent() {
        let mut set = RecentlySeenSet::new(200);
        for n in 0..250 {
            assert!(set.insert(id(n)));
        }
        assert_eq!(set.len(), 200);
        for n in 0..50 {
            assert!(!set.contains(&id(n)), "a{n} should have been evicted");
        }
        for n in 50..250 {
            assert!(set.contains(&id(n)), "a{n} should still be present");
        }
    }

    #[test]
    fn test_duplicate_insert_is_rejected_and_not_refreshed() {
        let mut set = RecentlySeenSet::new(2);
        assert!(set.insert(id(1)));
        assert!(set.insert(id(2)));
        assert!(!set.insert(id(1)));
        assert!(set.insert(id(3)));
        // a1 was the oldest even though it was re-inserted.
        assert!(!set.contains(&id(1)));
        assert!(set.contains(&id(2)));
        assert!(set.contains(&id(3)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut set = RecentlySeenSet::new(0);
        assert_eq!(set.capacity(), 1);
        set.insert(id(1));
        set.insert(id(2));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&id(2)));
    }
}
