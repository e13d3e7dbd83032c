// crates/cadok-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Mapping Store
// Description: Durable MappingStore backed by SQLite WAL.
// Purpose: Persist redirection mappings with atomic inserts and transitions.
// Dependencies: cadok-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`MappingStore`] using `SQLite`. The code
//! column is the primary key; a partial unique index keeps at most one active
//! mapping per trade even under concurrent writers. Terminal transitions are
//! conditional updates so races resolve inside the database, not in Rust.
//! Security posture: database contents are untrusted; rows that fail
//! normalization are reported as corruption, never silently repaired.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use cadok_core::EncryptedDestination;
use cadok_core::InsertOutcome;
use cadok_core::MappingStatus;
use cadok_core::MappingStore;
use cadok_core::RedirectionCode;
use cadok_core::RedirectionMapping;
use cadok_core::StoreError;
use cadok_core::TerminalStatus;
use cadok_core::Timestamp;
use cadok_core::TradeId;
use cadok_core::TransitionOutcome;
use cadok_core::UserId;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` mapping store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a configuration with defaults for the given path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding ciphertext blobs or address data.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Corrupt(message)
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error to a store error.
fn db_error(error: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed mapping store with WAL support.
///
/// # Invariants
/// - Codes are globally unique (primary key).
/// - At most one active mapping exists per trade (partial unique index).
/// - Connection access is serialized through a mutex.
#[derive(Clone)]
pub struct SqliteMappingStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteMappingStore {
    /// Opens an `SQLite`-backed mapping store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query
    /// fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.guard()?;
        let _: i64 =
            guard.query_row("SELECT 1", [], |row| row.get(0)).map_err(|err| db_error(&err))?;
        Ok(())
    }

    /// Locks the shared connection.
    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }
}

impl MappingStore for SqliteMappingStore {
    fn insert_active(&self, mapping: &RedirectionMapping) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.guard().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::from(db_error(&err)))?;

        if query_mapping_by_code(&tx, mapping.code.as_str())
            .map_err(StoreError::from)?
            .is_some()
        {
            return Ok(InsertOutcome::CodeExists);
        }
        if let Some(existing) =
            query_active_by_trade(&tx, mapping.trade_id.as_str()).map_err(StoreError::from)?
        {
            return Ok(InsertOutcome::ActiveExists(existing));
        }

        let inserted = tx.execute(
            "INSERT INTO redirection_mappings \
             (code, trade_id, from_user_id, to_user_id, encrypted_destination, status, \
              created_at, expires_at, consumed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
            params![
                mapping.code.as_str(),
                mapping.trade_id.as_str(),
                mapping.from_user_id.as_str(),
                mapping.to_user_id.as_str(),
                mapping.encrypted_destination.as_str(),
                mapping.status.as_str(),
                mapping.created_at.as_unix_millis(),
                mapping.expires_at.as_unix_millis(),
            ],
        );
        match inserted {
            Ok(_) => {
                tx.commit().map_err(|err| StoreError::from(db_error(&err)))?;
                Ok(InsertOutcome::Inserted)
            }
            // Constraint backstop for writers racing past the pre-checks.
            Err(error) if is_constraint_violation(&error) => {
                classify_constraint_conflict(&tx, mapping).map_err(StoreError::from)
            }
            Err(error) => Err(StoreError::from(db_error(&error))),
        }
    }

    fn get(&self, code: &RedirectionCode) -> Result<Option<RedirectionMapping>, StoreError> {
        let guard = self.guard().map_err(StoreError::from)?;
        query_mapping_by_code(&guard, code.as_str()).map_err(StoreError::from)
    }

    fn find_active_by_trade(
        &self,
        trade_id: &TradeId,
    ) -> Result<Option<RedirectionMapping>, StoreError> {
        let guard = self.guard().map_err(StoreError::from)?;
        query_active_by_trade(&guard, trade_id.as_str()).map_err(StoreError::from)
    }

    fn transition(
        &self,
        code: &RedirectionCode,
        to: TerminalStatus,
        at: Timestamp,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut guard = self.guard().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::from(db_error(&err)))?;

        let consumed_at: Option<i64> = match to {
            TerminalStatus::Consumed => Some(at.as_unix_millis()),
            TerminalStatus::Expired | TerminalStatus::Revoked => None,
        };
        let changed = tx
            .execute(
                "UPDATE redirection_mappings SET status = ?1, consumed_at = ?2 \
                 WHERE code = ?3 AND status = 'active'",
                params![to.as_status().as_str(), consumed_at, code.as_str()],
            )
            .map_err(|err| StoreError::from(db_error(&err)))?;
        if changed == 1 {
            tx.commit().map_err(|err| StoreError::from(db_error(&err)))?;
            return Ok(TransitionOutcome::Applied);
        }

        let status: Option<String> = tx
            .query_row(
                "SELECT status FROM redirection_mappings WHERE code = ?1",
                params![code.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::from(db_error(&err)))?;
        match status {
            None => Ok(TransitionOutcome::NotFound),
            Some(label) => {
                let status = MappingStatus::from_label(&label).ok_or_else(|| {
                    StoreError::from(SqliteStoreError::Corrupt(format!(
                        "unknown status label: {label}"
                    )))
                })?;
                Ok(TransitionOutcome::AlreadyTerminal(status))
            }
        }
    }

    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let guard = self.guard().map_err(StoreError::from)?;
        let changed = guard
            .execute(
                "UPDATE redirection_mappings SET status = 'expired' \
                 WHERE status = 'active' AND expires_at <= ?1",
                params![now.as_unix_millis()],
            )
            .map_err(|err| StoreError::from(db_error(&err)))?;
        Ok(u64::try_from(changed).unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Validates the configured database path before opening.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(SqliteStoreError::Invalid("store path is empty".to_string()));
    }
    if raw.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "store path too long: {} bytes (max {MAX_TOTAL_PATH_LENGTH})",
            raw.len()
        )));
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path resolves to a directory".to_string(),
        ));
    }
    Ok(())
}

/// Creates the parent directory of the database file when missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Opens a connection and applies pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let connection =
        Connection::open(&config.path).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    connection
        .pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
        .map_err(|err| db_error(&err))?;
    connection
        .pragma_update(None, "synchronous", config.sync_mode.pragma_value())
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(connection)
}

/// Creates tables and verifies the schema version.
fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    let version: i64 = connection
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|err| db_error(&err))?;
    if version == 0 {
        connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS redirection_mappings (
                    code TEXT PRIMARY KEY,
                    trade_id TEXT NOT NULL,
                    from_user_id TEXT NOT NULL,
                    to_user_id TEXT NOT NULL,
                    encrypted_destination TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    expires_at INTEGER NOT NULL,
                    consumed_at INTEGER
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_one_active_per_trade
                    ON redirection_mappings(trade_id) WHERE status = 'active';",
            )
            .map_err(|err| db_error(&err))?;
        connection
            .pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|err| db_error(&err))?;
        return Ok(());
    }
    if version != SCHEMA_VERSION {
        return Err(SqliteStoreError::VersionMismatch(format!(
            "expected schema version {SCHEMA_VERSION}, found {version}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw row tuple before normalization.
type MappingRow = (String, String, String, String, String, String, i64, i64, Option<i64>);

/// Shared column list for mapping queries.
const MAPPING_COLUMNS: &str = "code, trade_id, from_user_id, to_user_id, \
     encrypted_destination, status, created_at, expires_at, consumed_at";

/// Reads a raw row tuple from a query result.
fn read_row(row: &rusqlite::Row<'_>) -> Result<MappingRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

/// Normalizes a raw row into a mapping, failing closed on bad data.
fn build_mapping(row: MappingRow) -> Result<RedirectionMapping, SqliteStoreError> {
    let (code, trade_id, from_user, to_user, blob, status, created_at, expires_at, consumed_at) =
        row;
    let code = RedirectionCode::parse(&code)
        .map_err(|_| SqliteStoreError::Corrupt("stored code fails normalization".to_string()))?;
    let status = MappingStatus::from_label(&status)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown status label: {status}")))?;
    Ok(RedirectionMapping {
        code,
        trade_id: TradeId::new(trade_id),
        from_user_id: UserId::new(from_user),
        to_user_id: UserId::new(to_user),
        encrypted_destination: EncryptedDestination::new(blob),
        status,
        created_at: Timestamp::from_unix_millis(created_at),
        expires_at: Timestamp::from_unix_millis(expires_at),
        consumed_at: consumed_at.map(Timestamp::from_unix_millis),
    })
}

/// Fetches one mapping by code.
fn query_mapping_by_code(
    connection: &Connection,
    code: &str,
) -> Result<Option<RedirectionMapping>, SqliteStoreError> {
    let row = connection
        .query_row(
            &format!("SELECT {MAPPING_COLUMNS} FROM redirection_mappings WHERE code = ?1"),
            params![code],
            read_row,
        )
        .optional()
        .map_err(|err| db_error(&err))?;
    row.map(build_mapping).transpose()
}

/// Fetches the active mapping for a trade.
fn query_active_by_trade(
    connection: &Connection,
    trade_id: &str,
) -> Result<Option<RedirectionMapping>, SqliteStoreError> {
    let row = connection
        .query_row(
            &format!(
                "SELECT {MAPPING_COLUMNS} FROM redirection_mappings \
                 WHERE trade_id = ?1 AND status = 'active'"
            ),
            params![trade_id],
            read_row,
        )
        .optional()
        .map_err(|err| db_error(&err))?;
    row.map(build_mapping).transpose()
}

/// Returns true for unique-constraint violations.
fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
    )
}

/// Resolves a constraint violation into the outcome the caller must handle.
fn classify_constraint_conflict(
    tx: &Transaction<'_>,
    mapping: &RedirectionMapping,
) -> Result<InsertOutcome, SqliteStoreError> {
    if query_mapping_by_code(tx, mapping.code.as_str())?.is_some() {
        return Ok(InsertOutcome::CodeExists);
    }
    match query_active_by_trade(tx, mapping.trade_id.as_str())? {
        Some(existing) => Ok(InsertOutcome::ActiveExists(existing)),
        None => Err(SqliteStoreError::Db(
            "constraint violation without a conflicting row".to_string(),
        )),
    }
}
