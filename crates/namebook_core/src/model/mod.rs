//! Domain model for the names list.
//!
//! # Responsibility
//! - Define the record shape shared by storage, store and consumers.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `RecordId`.
//! - Deletion is a hard delete; ids are never handed out again.

pub mod record;
