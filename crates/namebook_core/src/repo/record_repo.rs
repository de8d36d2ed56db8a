//! Record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD statements over the `names` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Each write is one statement; it either fully applies or not at all.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Lists are ordered by ascending id.

use crate::db::schema::latest_version;
use crate::db::DbError;
use crate::model::record::{Record, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NAMES_TABLE: &str = "names";
const NAMES_COLUMNS: [&str; 2] = ["id", "text"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection schema version does not match this binary.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "record repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for record CRUD operations.
pub trait RecordRepository {
    /// Inserts a row and returns it with the storage-assigned id.
    fn insert_record(&self, text: &str) -> RepoResult<Record>;
    /// Replaces the text of one row. Returns `false` when no row matched.
    fn update_record(&self, id: RecordId, text: &str) -> RepoResult<bool>;
    /// Deletes one row. Returns `false` when no row matched.
    fn delete_record(&self, id: RecordId) -> RepoResult<bool>;
    /// Reads one row by id. Returns `None` when no row matches.
    fn get_record(&self, id: RecordId) -> RepoResult<Option<Record>>;
    /// Lists all rows by ascending id.
    fn list_records(&self) -> RepoResult<Vec<Record>>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository from a connection whose schema is applied.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `user_version` differs from this binary.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the layout is off.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_record_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Constructs a repository without schema checks.
    ///
    /// Callers must have verified the connection through `try_new` before.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert_record(&self, text: &str) -> RepoResult<Record> {
        self.conn
            .execute("INSERT INTO names (text) VALUES (?1);", params![text])?;
        let id = self.conn.last_insert_rowid();
        Ok(Record::new(id, text))
    }

    fn update_record(&self, id: RecordId, text: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE names SET text = ?1 WHERE id = ?2;",
            params![text, id],
        )?;
        Ok(changed > 0)
    }

    fn delete_record(&self, id: RecordId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM names WHERE id = ?1;", params![id])?;
        Ok(changed > 0)
    }

    fn get_record(&self, id: RecordId) -> RepoResult<Option<Record>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, text FROM names WHERE id = ?1;",
                params![id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, text)| validate_record(id, text)).transpose()
    }

    fn list_records(&self) -> RepoResult<Vec<Record>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, text FROM names ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<Record> {
    let id: i64 = row.get("id")?;
    let text: String = row.get("text")?;
    validate_record(id, text)
}

fn validate_record(id: i64, text: String) -> RepoResult<Record> {
    if id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid id value `{id}` in names.id"
        )));
    }
    Ok(Record::new(id, text))
}

fn ensure_record_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, NAMES_TABLE)? {
        return Err(RepoError::MissingRequiredTable(NAMES_TABLE));
    }

    for column in NAMES_COLUMNS {
        if !table_has_column(conn, NAMES_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: NAMES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
