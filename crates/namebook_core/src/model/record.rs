//! Record domain model.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and is always positive.
//! - `text` is free-form; empty and duplicate values are allowed.

use serde::{Deserialize, Serialize};

/// Store-assigned identifier for one name entry.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = i64;

/// One persisted name entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Monotonically increasing id assigned on creation.
    pub id: RecordId,
    /// Display text of the entry.
    pub text: String,
}

impl Record {
    pub fn new(id: RecordId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}
