//! Schema creation for the names table.
//!
//! # Responsibility
//! - Create the single `names` table if absent.
//! - Mirror the applied schema version into `PRAGMA user_version`.
//!
//! # Invariants
//! - Applying the schema is idempotent.
//! - Databases written by a newer binary are rejected, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_VERSION
}

/// Ensures the `names` table exists and the schema version is recorded.
///
/// The table statement runs on every call, so a table lost under a current
/// `user_version` is recreated.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    if current_version < SCHEMA_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    tx.commit()?;

    if current_version < SCHEMA_VERSION {
        info!(
            "event=schema_apply module=db status=ok from_version={} to_version={}",
            current_version, SCHEMA_VERSION
        );
    }
    Ok(())
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
