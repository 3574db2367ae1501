//! Per-user session state.
//!
//! A session records which identifier kind a user most recently selected
//! from the menu. Sessions are created implicitly on first selection,
//! overwritten on every later selection, and live for the lifetime of the
//! process. There is no delete and no persistence.

use dashmap::DashMap;

use talash_registry::IdentifierKind;

/// Concurrent map from transport user id to the selected identifier kind.
///
/// Per-key last-write-wins; writes for distinct users never interfere. The
/// store is injected into the conversation engine rather than accessed as
/// global state.
#[derive(Debug, Default)]
pub struct SessionStore {
    selections: DashMap<String, IdentifierKind>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's selected kind, replacing any previous selection.
    pub fn set_selection(&self, user_id: &str, kind: IdentifierKind) {
        self.selections.insert(user_id.to_string(), kind);
    }

    /// The user's current selection, if they have ever picked one.
    #[must_use]
    pub fn selection(&self, user_id: &str) -> Option<IdentifierKind> {
        self.selections.get(user_id).map(|entry| *entry.value())
    }

    /// Number of users with an active selection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}
