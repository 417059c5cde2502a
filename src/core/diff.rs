//! # Dedup & diff engine.
//!
//! Given a fresh page (newest first) and a target's cursor, decides which
//! actions are genuinely new.
//!
//! ```text
//! page:   [a5, a4, a3, a2, a1]     cursor = a3
//!          └──┬──┘
//!         newer_than → [a5, a4]
//!         advance    → fresh (oldest first) = [a4, a5], cursor = a5
//! ```
//!
//! ## Rules
//! - **No cursor**: baseline. The cursor is set to the newest id, nothing is fresh.
//! - **Cursor on the page**: everything before it is a candidate.
//! - **Cursor not on the page**: the whole page is a candidate (the remote
//!   window moved past the cursor); the recently-seen set filters what was
//!   already delivered.
//! - Candidates already in the recently-seen set are dropped; survivors are
//!   inserted into it.
//! - An empty page changes nothing.

use crate::model::{Action, ActionId, RecentlySeenSet};

/// Outcome of [`advance`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Advance {
    /// New cursor, when it moved.
    pub cursor: Option<ActionId>,
    /// Actions to deliver, oldest first.
    pub fresh: Vec<Action>,
    /// True if this was a baseline (no prior cursor).
    pub baseline: bool,
}

/// Strictly-newer prefix of `page` relative to `cursor`.
///
/// Returns `None` if `cursor` is not on the page.
pub fn newer_than<'a>(page: &'a [Action], cursor: &ActionId) -> Option<&'a [Action]> {
    page.iter()
        .position(|a| &a.id == cursor)
        .map(|idx| &page[..idx])
}

/// Diffs `page` against `cursor`, updating `recent` with delivered ids.
pub fn advance(cursor: Option<&ActionId>, page: &[Action], recent: &mut RecentlySeenSet) -> Advance {
    let Some(newest) = page.first() else {
        return Advance::default();
    };

    let Some(cursor) = cursor else {
        return Advance {
            cursor: Some(newest.id.clone()),
            fresh: Vec::new(),
            baseline: true,
        };
    };

    let candidates = newer_than(page, cursor).unwrap_or(page);
    let fresh = candidates
        .iter()
        .rev()
        .filter(|a| recent.insert(a.id.clone()))
        .cloned()
        .collect();

    Advance {
        cursor: (&newest.id != cursor).then(|| newest.id.clone()),
        fresh,
        baseline: false,
    }
}
