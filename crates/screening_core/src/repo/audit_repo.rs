//! Append-only audit log over the log store.
//!
//! # Responsibility
//! - Persist immutable snapshots of a record keyed by `"<id>-<curr_no>"`.
//! - Read a record's logged history back in sequence order.
//!
//! # Invariants
//! - Log keys are derived only from the record identity and `curr_no`.
//! - A repeated `(id, curr_no)` pair fails; entries are never overwritten.
//! - `curr_no` is caller-assigned. Concurrent writers must serialize their
//!   own numbering; this module only relies on key uniqueness.

use crate::context::OpContext;
use crate::db::{DbError, DbResult, StoreHandle, StoreKind};
use crate::error::{read_error, write_error, DataError, DataResult};
use crate::model::assessment::HealthAssessment;
use crate::repo::{decode_document, encode_document, ensure_key, log_outcome};
use rusqlite::params;
use std::time::Instant;

const MODULE: &str = "audit_log";

/// One persisted snapshot from the log store.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Composite log identity, `"<record_id>-<curr_no>"`.
    pub key: String,
    pub record_id: String,
    pub curr_no: u32,
    /// Snapshot as persisted; its `id` is the composite log key.
    pub record: HealthAssessment,
}

/// Data access contract for the audit log.
pub trait AuditLog {
    /// Writes a snapshot of `record` and returns the log entry key.
    fn save_log(&self, ctx: &OpContext, record: &HealthAssessment) -> DataResult<String>;
    /// Returns every logged snapshot of `record_id`, ordered by `curr_no`.
    fn history(&self, ctx: &OpContext, record_id: &str) -> DataResult<Vec<LogEntry>>;
}

/// Builds the log entry key for a record snapshot.
pub fn log_key(record_id: &str, curr_no: u32) -> String {
    format!("{record_id}-{curr_no}")
}

/// SQLite-backed audit log.
#[derive(Debug, Clone)]
pub struct SqliteAuditLog {
    store: StoreHandle,
}

impl SqliteAuditLog {
    /// Binds the audit log to a log store handle.
    pub fn try_new(store: StoreHandle) -> DbResult<Self> {
        if store.kind() != StoreKind::Log {
            return Err(DbError::WrongStoreKind {
                expected: StoreKind::Log,
                actual: store.kind(),
            });
        }
        Ok(Self { store })
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

impl AuditLog for SqliteAuditLog {
    fn save_log(&self, ctx: &OpContext, record: &HealthAssessment) -> DataResult<String> {
        const OP: &str = "save_log";
        let started_at = Instant::now();

        let result = prepare_snapshot(OP, record).and_then(|(key, curr_no, document)| {
            self.store.run(ctx, OP, |conn| {
                conn.execute(
                    "INSERT INTO health_assessment_log (doc_key, record_key, curr_no, document)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![key, record.id, curr_no, document],
                )
                .map_err(|err| write_error(ctx, OP, &key, err))?;
                Ok(key)
            })
        });

        let logged_key = match &result {
            Ok(key) => key.as_str(),
            Err(_) => record.id.as_str(),
        };
        log_outcome(MODULE, OP, logged_key, started_at, &result);
        result
    }

    fn history(&self, ctx: &OpContext, record_id: &str) -> DataResult<Vec<LogEntry>> {
        const OP: &str = "history";
        let started_at = Instant::now();

        let result = ensure_key(OP, record_id).and_then(|()| {
            self.store.run(ctx, OP, |conn| {
                let fail = |err| read_error(ctx, OP, err);
                let mut stmt = conn
                    .prepare(
                        "SELECT doc_key, curr_no, document
                         FROM health_assessment_log
                         WHERE record_key = ?1
                         ORDER BY curr_no ASC;",
                    )
                    .map_err(fail)?;
                let mut rows = stmt.query([record_id]).map_err(fail)?;

                let mut entries = Vec::new();
                while let Some(row) = rows.next().map_err(fail)? {
                    let key: String = row.get(0).map_err(fail)?;
                    let curr_no: u32 = row.get(1).map_err(fail)?;
                    let document: String = row.get(2).map_err(fail)?;
                    entries.push(LogEntry {
                        record: decode_document(&key, &document)?,
                        key,
                        record_id: record_id.to_string(),
                        curr_no,
                    });
                }
                Ok(entries)
            })
        });

        log_outcome(MODULE, OP, record_id, started_at, &result);
        result
    }
}

/// Validates `record` and renders its log key and snapshot document.
fn prepare_snapshot(
    operation: &'static str,
    record: &HealthAssessment,
) -> DataResult<(String, u32, String)> {
    if record.id.is_empty() {
        return Err(DataError::validation(
            operation,
            "record has no identity to key the log entry to",
        ));
    }
    ensure_key(operation, &record.id)?;

    let Some(audit) = record.audit.as_ref() else {
        return Err(DataError::validation(
            operation,
            "record has no audit block",
        ));
    };

    let key = log_key(&record.id, audit.curr_no);
    ensure_key(operation, &key)?;

    let mut snapshot = record.clone();
    snapshot.id = key.clone();
    let document = encode_document(operation, &snapshot)?;
    Ok((key, audit.curr_no, document))
}
