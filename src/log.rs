//! Append-only modification log
//!
//! One entry per successfully applied batch. Entries are never mutated or
//! removed; the log is the session's audit trail.

use crate::session::{ModificationId, SessionModification};
use serde::{Deserialize, Serialize};

/// Per-session audit trail of applied batches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationLog {
    entries: Vec<SessionModification>,
}

impl ModificationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning its ID
    pub fn append(&mut self, modification: SessionModification) -> ModificationId {
        let id = modification.id.clone();
        self.entries.push(modification);
        id
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[SessionModification] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
