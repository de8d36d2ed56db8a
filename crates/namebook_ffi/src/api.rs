//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the names store to Dart via FRB as an explicit handle.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every storage failure reaches Dart as `ok=false` with an `error_code`.
//! - Store calls are async on the Dart side; only diagnostics are `sync`.

use log::warn;
use namebook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Record, RecordStore, StoreError, StoreResult,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const DB_PATH_ENV: &str = "NAMEBOOK_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "namebook.sqlite3";
const LOCK_POISONED_CODE: &str = "lock_poisoned";

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Resolves the database path used when the UI does not pass one.
///
/// `NAMEBOOK_DB_PATH` wins when set and non-blank.
#[flutter_rust_bridge::frb(sync)]
pub fn default_db_path() -> String {
    resolve_default_db_path().display().to_string()
}

/// One name entry as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameItem {
    pub id: i64,
    pub text: String,
}

impl From<Record> for NameItem {
    fn from(value: Record) -> Self {
        Self {
            id: value.id,
            text: value.text,
        }
    }
}

/// Response for `NamesHandle::open`.
pub struct NamesOpenResponse {
    /// Opened handle; `None` when opening failed.
    pub handle: Option<NamesHandle>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Response for list/initialize calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamesListResponse {
    pub ok: bool,
    /// Records ordered by ascending id; empty on failure.
    pub items: Vec<NameItem>,
    pub error_code: Option<String>,
    pub message: String,
}

/// Response for add/update/delete calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameActionResponse {
    /// Whether the call reached storage without error.
    pub ok: bool,
    /// `false` when update/delete matched no record.
    pub changed: bool,
    /// Created record for `add`.
    pub item: Option<NameItem>,
    pub error_code: Option<String>,
    pub message: String,
}

impl NamesListResponse {
    fn success(items: Vec<Record>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            items: items.into_iter().map(NameItem::from).collect(),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            error_code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

impl NameActionResponse {
    fn success(changed: bool, item: Option<NameItem>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed,
            item,
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            item: None,
            error_code: Some(code.to_string()),
            message: message.into(),
        }
    }
}

/// Explicit store handle owned by the Dart side.
///
/// The mutex makes the handle shareable with FRB's worker pool; it is not a
/// license for concurrent use, calls are still served one at a time.
#[flutter_rust_bridge::frb(opaque)]
pub struct NamesHandle {
    store: Mutex<RecordStore>,
}

impl NamesHandle {
    /// Opens the store at `db_path` (blank → `default_db_path()`).
    ///
    /// # FFI contract
    /// - Does not create the schema; call `initialize` next.
    /// - Never panics.
    pub fn open(db_path: String) -> NamesOpenResponse {
        let trimmed = db_path.trim();
        let path = if trimmed.is_empty() {
            resolve_default_db_path()
        } else {
            PathBuf::from(trimmed)
        };

        match RecordStore::open(&path) {
            Ok(store) => NamesOpenResponse {
                handle: Some(Self {
                    store: Mutex::new(store),
                }),
                error_code: None,
                message: "Store opened.".to_string(),
            },
            Err(err) => NamesOpenResponse {
                handle: None,
                error_code: Some(err.code().to_string()),
                message: format!("names_open failed: {err}"),
            },
        }
    }

    /// Creates the table if needed and returns the current records.
    pub fn initialize(&self) -> NamesListResponse {
        self.list_call("names_initialize", |store| {
            store.initialize()?;
            Ok(store.snapshot().to_vec())
        })
    }

    /// Re-reads all records from storage.
    pub fn list_all(&self) -> NamesListResponse {
        self.list_call("names_list_all", |store| store.list_all())
    }

    /// Adds one name; empty text is accepted.
    pub fn add(&self, text: String) -> NameActionResponse {
        self.action_call("names_add", |store| {
            let record = store.add(text)?;
            Ok(NameActionResponse::success(
                true,
                Some(record.into()),
                "Name added.",
            ))
        })
    }

    /// Replaces the text of `id`; `changed=false` when it does not exist.
    pub fn update(&self, id: i64, text: String) -> NameActionResponse {
        self.action_call("names_update", |store| {
            let changed = store.update(id, text)?;
            let message = if changed {
                "Name updated."
            } else {
                "Name not found."
            };
            Ok(NameActionResponse::success(changed, None, message))
        })
    }

    /// Deletes `id`; `changed=false` when it does not exist.
    pub fn delete(&self, id: i64) -> NameActionResponse {
        self.action_call("names_delete", |store| {
            let changed = store.delete(id)?;
            let message = if changed {
                "Name deleted."
            } else {
                "Name not found."
            };
            Ok(NameActionResponse::success(changed, None, message))
        })
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, RecordStore>, String> {
        self.store.lock().map_err(|_| {
            warn!("event={operation} module=ffi status=error error_code={LOCK_POISONED_CODE}");
            format!("{operation} failed: store lock poisoned")
        })
    }

    fn list_call(
        &self,
        operation: &str,
        f: impl FnOnce(&mut RecordStore) -> StoreResult<Vec<Record>>,
    ) -> NamesListResponse {
        let mut store = match self.lock(operation) {
            Ok(store) => store,
            Err(message) => return NamesListResponse::failure(LOCK_POISONED_CODE, message),
        };
        match f(&mut store) {
            Ok(records) => {
                let message = format!("{} name(s).", records.len());
                NamesListResponse::success(records, message)
            }
            Err(err) => NamesListResponse::failure(err.code(), failure_message(operation, &err)),
        }
    }

    fn action_call(
        &self,
        operation: &str,
        f: impl FnOnce(&mut RecordStore) -> StoreResult<NameActionResponse>,
    ) -> NameActionResponse {
        let mut store = match self.lock(operation) {
            Ok(store) => store,
            Err(message) => return NameActionResponse::failure(LOCK_POISONED_CODE, message),
        };
        match f(&mut store) {
            Ok(response) => response,
            Err(err) => NameActionResponse::failure(err.code(), failure_message(operation, &err)),
        }
    }
}

fn failure_message(operation: &str, err: &StoreError) -> String {
    format!("{operation} failed: {err}")
}

fn resolve_default_db_path() -> PathBuf {
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{core_version, init_logging, ping, NameItem, NamesHandle};

    fn open_handle(dir: &tempfile::TempDir) -> NamesHandle {
        let path = dir.path().join("names.sqlite3");
        let response = NamesHandle::open(path.display().to_string());
        assert!(response.error_code.is_none(), "{}", response.message);
        response.handle.expect("open should return a handle")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn calls_before_initialize_report_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let handle = open_handle(&dir);

        let added = handle.add("early".to_string());
        assert!(!added.ok);
        assert_eq!(added.error_code.as_deref(), Some("not_initialized"));

        let listed = handle.list_all();
        assert!(!listed.ok);
        assert_eq!(listed.error_code.as_deref(), Some("not_initialized"));
    }

    #[test]
    fn handle_runs_full_crud_flow() {
        let dir = tempfile::tempdir().unwrap();
        let handle = open_handle(&dir);

        let initialized = handle.initialize();
        assert!(initialized.ok, "{}", initialized.message);
        assert!(initialized.items.is_empty());

        let added = handle.add("Alice".to_string());
        assert!(added.ok && added.changed, "{}", added.message);
        let alice = added.item.expect("add should return the created item");

        let updated = handle.update(alice.id, "Alicia".to_string());
        assert!(updated.ok && updated.changed);

        let missing = handle.delete(9999);
        assert!(missing.ok);
        assert!(!missing.changed);
        assert_eq!(missing.message, "Name not found.");

        let listed = handle.list_all();
        assert_eq!(
            listed.items,
            vec![NameItem {
                id: alice.id,
                text: "Alicia".to_string()
            }]
        );

        let deleted = handle.delete(alice.id);
        assert!(deleted.ok && deleted.changed);
        assert!(handle.list_all().items.is_empty());
    }

    #[test]
    fn open_on_unreachable_path_reports_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("names.sqlite3");

        let response = NamesHandle::open(path.display().to_string());
        assert!(response.handle.is_none());
        assert_eq!(response.error_code.as_deref(), Some("storage_unavailable"));
        assert!(response.message.starts_with("names_open failed"));
    }
}
