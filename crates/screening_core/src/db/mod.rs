//! SQLite store bootstrap and shared store handles.
//!
//! # Responsibility
//! - Open and configure the live and log stores.
//! - Apply each store's schema migrations in deterministic order.
//! - Hand out cloneable [`StoreHandle`]s that run operations under an
//!   [`OpContext`].
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - A `StoreHandle` only wraps connections whose schema is fully migrated.
//! - Deadline/cancellation of the caller is propagated into SQLite through
//!   the connection progress handler.

use crate::context::OpContext;
use crate::error::{DataError, DataResult};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub mod migrations;
mod open;

pub use open::{
    open_live_store, open_live_store_in_memory, open_log_store, open_log_store_in_memory,
    open_store, open_store_in_memory,
};

/// Number of SQLite VM steps between two deadline/cancel checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// SQL function lowercasing text with full Unicode case mapping.
/// Built-in `lower()` and `LIKE` only fold ASCII.
pub(crate) const UNICODE_LOWER_FN: &str = "unicode_lower";

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap-time store error.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("{kind} store schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        kind: StoreKind,
        db_version: u32,
        latest_supported: u32,
    },
    #[error("{kind} store is not initialized: expected schema version {expected}, found {actual}")]
    UninitializedStore {
        kind: StoreKind,
        expected: u32,
        actual: u32,
    },
    #[error("{kind} store is missing collection `{collection}`")]
    MissingCollection {
        kind: StoreKind,
        collection: &'static str,
    },
    #[error("expected a {expected} store handle, got {actual}")]
    WrongStoreKind {
        expected: StoreKind,
        actual: StoreKind,
    },
    #[error("{kind} store handle is poisoned")]
    Poisoned { kind: StoreKind },
}

/// Which logical database a handle points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Current, mutable record state.
    Live,
    /// Append-only historical snapshots.
    Log,
}

impl StoreKind {
    /// Name of the document collection held by this store.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Live => "health_assessment",
            Self::Log => "health_assessment_log",
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Log => write!(f, "log"),
        }
    }
}

/// Long-lived, shareable handle to one store.
///
/// Clones share the same underlying connection; access is serialized.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    kind: StoreKind,
    conn: Arc<Mutex<Connection>>,
}

impl StoreHandle {
    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - `UninitializedStore` when the schema version is not the latest for
    ///   `kind`.
    /// - `MissingCollection` when the collection table does not exist.
    pub fn new(conn: Connection, kind: StoreKind) -> DbResult<Self> {
        let expected = migrations::latest_version(kind);
        let actual = migrations::current_user_version(&conn)?;
        if actual != expected {
            return Err(DbError::UninitializedStore {
                kind,
                expected,
                actual,
            });
        }

        let collection = kind.collection();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [collection],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::MissingCollection { kind, collection });
        }

        register_functions(&conn)?;

        Ok(Self {
            kind,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Counts documents currently held in this store's collection.
    pub fn document_count(&self) -> DbResult<u64> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Poisoned { kind: self.kind })?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {};", self.kind.collection()),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Runs `op` on the connection under the caller's deadline/cancellation.
    ///
    /// The context is checked before waiting for the connection, again once
    /// the connection is held, and periodically while SQLite executes.
    pub(crate) fn run<T>(
        &self,
        ctx: &OpContext,
        operation: &'static str,
        op: impl FnOnce(&Connection) -> DataResult<T>,
    ) -> DataResult<T> {
        if let Some(reason) = ctx.interrupt_reason() {
            return Err(DataError::Interrupted { operation, reason });
        }

        let conn = self.conn.lock().map_err(|_| DataError::StoreUnavailable {
            operation,
            reason: format!("{} store handle is poisoned", self.kind),
        })?;

        if let Some(reason) = ctx.interrupt_reason() {
            return Err(DataError::Interrupted { operation, reason });
        }

        if !ctx.is_bounded() {
            return op(&conn);
        }

        let watched = ctx.clone();
        conn.progress_handler(
            PROGRESS_CHECK_OPS,
            Some(move || watched.interrupt_reason().is_some()),
        );
        let result = op(&conn);
        conn.progress_handler(0, None::<fn() -> bool>);
        result
    }
}

fn register_functions(conn: &Connection) -> DbResult<()> {
    conn.create_scalar_function(
        UNICODE_LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| match ctx.get_raw(0) {
            ValueRef::Text(bytes) => Ok(Some(String::from_utf8_lossy(bytes).to_lowercase())),
            _ => Ok(None),
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{StoreKind, UNICODE_LOWER_FN};
    use crate::context::OpContext;
    use crate::db::open_live_store_in_memory;

    #[test]
    fn unicode_lower_folds_non_ascii_and_passes_null_through() {
        let store = open_live_store_in_memory().unwrap();
        assert_eq!(store.kind(), StoreKind::Live);

        let (lowered, null) = store
            .run(&OpContext::background(), "test", |conn| {
                let lowered: String = conn
                    .query_row(&format!("SELECT {UNICODE_LOWER_FN}('ÉLEVÉ Straße');"), [], |row| {
                        row.get(0)
                    })
                    .unwrap();
                let null: Option<String> = conn
                    .query_row(&format!("SELECT {UNICODE_LOWER_FN}(NULL);"), [], |row| row.get(0))
                    .unwrap();
                Ok((lowered, null))
            })
            .unwrap();
        assert_eq!(lowered, "élevé straße");
        assert!(null.is_none());
    }
}
