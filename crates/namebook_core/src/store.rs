//! Durable record store with an in-memory mirrored snapshot.
//!
//! # Responsibility
//! - Own the SQLite handle and the ordered snapshot of all records.
//! - Apply each mutation to durable storage first, then to the snapshot.
//!
//! # Invariants
//! - The snapshot equals `list_all()` after every completed operation.
//! - A failed durable mutation never touches the snapshot.
//! - Consumers only ever see `&[Record]` or owned copies.
//! - Log lines carry ids and counts, never record text.

use crate::db::schema::apply_schema;
use crate::db::{open_connection, open_connection_in_memory, DbError};
use crate::model::record::{Record, RecordId};
use crate::repo::record_repo::{RecordRepository, RepoError, SqliteRecordRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error surfaced to consumers.
#[derive(Debug)]
pub enum StoreError {
    /// Storage could not be opened or a statement failed.
    StorageUnavailable(RepoError),
    /// Operation invoked before `initialize()` succeeded.
    NotInitialized,
}

impl StoreError {
    /// Stable machine-readable code for envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::NotInitialized => "not_initialized",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::NotInitialized => write!(f, "record store is not initialized"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::NotInitialized => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(RepoError::from(value))
    }
}

/// Names store: durable table plus ordered in-memory snapshot.
///
/// Mutating operations take `&mut self`, so one store instance serves one
/// actor at a time. Wrap it in a lock to share it across threads.
pub struct RecordStore {
    conn: Connection,
    snapshot: Vec<Record>,
    initialized: bool,
}

impl RecordStore {
    /// Opens (or creates) the database file backing the store.
    ///
    /// The schema is not touched until `initialize()` is called.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_connection(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a store backed by a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_connection_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already opened connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            snapshot: Vec::new(),
            initialized: false,
        }
    }

    /// Ensures the backing table exists and loads the snapshot from it.
    ///
    /// Idempotent: repeated calls re-check the schema and re-read storage.
    pub fn initialize(&mut self) -> StoreResult<()> {
        let started_at = Instant::now();
        if let Err(err) = apply_schema(&mut self.conn) {
            return Err(storage_failure("initialize", err.into()));
        }

        let records = SqliteRecordRepository::try_new(&self.conn)
            .and_then(|repo| repo.list_records())
            .map_err(|err| storage_failure("initialize", err))?;

        self.snapshot = records;
        self.initialized = true;
        info!(
            "event=store_initialize module=store status=ok records={} duration_ms={}",
            self.snapshot.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Returns whether `initialize()` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Re-reads all records from durable storage, ordered by ascending id.
    ///
    /// Does not modify the snapshot.
    pub fn list_all(&self) -> StoreResult<Vec<Record>> {
        self.repository()?
            .list_records()
            .map_err(|err| storage_failure("list_all", err))
    }

    /// Read-only view of the in-memory snapshot.
    pub fn snapshot(&self) -> &[Record] {
        &self.snapshot
    }

    /// Looks up one record in the snapshot.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.snapshot.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Inserts a new record and appends it to the snapshot.
    ///
    /// Empty and duplicate texts are accepted.
    pub fn add(&mut self, text: impl Into<String>) -> StoreResult<Record> {
        let text = text.into();
        let record = self
            .repository()?
            .insert_record(&text)
            .map_err(|err| storage_failure("add", err))?;

        self.snapshot.push(record.clone());
        debug!(
            "event=record_add module=store status=ok id={} records={}",
            record.id,
            self.snapshot.len()
        );
        Ok(record)
    }

    /// Replaces the text of `id`.
    ///
    /// Returns `false` and leaves state unchanged when no record matches.
    pub fn update(&mut self, id: RecordId, text: impl Into<String>) -> StoreResult<bool> {
        let text = text.into();
        let changed = self
            .repository()?
            .update_record(id, &text)
            .map_err(|err| storage_failure("update", err))?;

        if !changed {
            debug!("event=record_update module=store status=not_found id={id}");
            return Ok(false);
        }

        self.apply_update(id, text);
        debug!("event=record_update module=store status=ok id={id}");
        Ok(true)
    }

    /// Deletes `id` from storage and from the snapshot.
    ///
    /// Returns `false` and leaves state unchanged when no record matches.
    pub fn delete(&mut self, id: RecordId) -> StoreResult<bool> {
        let changed = self
            .repository()?
            .delete_record(id)
            .map_err(|err| storage_failure("delete", err))?;

        if !changed {
            debug!("event=record_delete module=store status=not_found id={id}");
            return Ok(false);
        }

        self.snapshot.retain(|record| record.id != id);
        debug!(
            "event=record_delete module=store status=ok id={} records={}",
            id,
            self.snapshot.len()
        );
        Ok(true)
    }

    /// Replaces the snapshot with a fresh read of durable storage.
    ///
    /// On failure the previous snapshot is kept.
    pub fn reload(&mut self) -> StoreResult<&[Record]> {
        let records = self
            .repository()?
            .list_records()
            .map_err(|err| storage_failure("reload", err))?;
        self.snapshot = records;
        Ok(&self.snapshot)
    }

    /// Releases the SQLite handle, surfacing close failures.
    pub fn close(self) -> StoreResult<()> {
        match self.conn.close() {
            Ok(()) => {
                info!("event=store_close module=store status=ok");
                Ok(())
            }
            Err((_conn, err)) => Err(storage_failure("close", err.into())),
        }
    }

    fn repository(&self) -> StoreResult<SqliteRecordRepository<'_>> {
        if !self.initialized {
            return Err(StoreError::NotInitialized);
        }
        Ok(SqliteRecordRepository::new_unchecked(&self.conn))
    }

    // Snapshot is sorted by id. A committed row missing from it was written
    // by another connection; it is placed at its id position.
    fn apply_update(&mut self, id: RecordId, text: String) {
        match self.snapshot.binary_search_by_key(&id, |record| record.id) {
            Ok(index) => self.snapshot[index].text = text,
            Err(index) => {
                warn!("event=snapshot_insert_missing module=store status=ok id={id}");
                self.snapshot.insert(index, Record::new(id, text));
            }
        }
    }
}

fn storage_failure(operation: &'static str, err: RepoError) -> StoreError {
    error!(
        "event=store_{} module=store status=error error_code=storage_unavailable error={}",
        operation, err
    );
    StoreError::StorageUnavailable(err)
}
