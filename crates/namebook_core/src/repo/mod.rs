//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for name records.
//! - Isolate SQLite query details from the store.
//!
//! # Invariants
//! - "No row matched" is reported as `false`, not as an error.
//! - Storage failures surface as `RepoError`, never swallowed.

pub mod record_repo;
