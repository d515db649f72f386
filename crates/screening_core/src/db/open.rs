//! Store bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite databases for the live and log stores.
//! - Configure connection pragmas and apply the store's migrations before
//!   returning a usable [`StoreHandle`].
//!
//! # Invariants
//! - Returned handles have migrations fully applied for their kind.
//! - File-backed stores use WAL journaling.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, StoreHandle, StoreKind};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the live store at `path`.
pub fn open_live_store(path: impl AsRef<Path>) -> DbResult<StoreHandle> {
    open_store(path, StoreKind::Live)
}

/// Opens the log store at `path`.
pub fn open_log_store(path: impl AsRef<Path>) -> DbResult<StoreHandle> {
    open_store(path, StoreKind::Log)
}

/// Opens a private in-memory live store.
pub fn open_live_store_in_memory() -> DbResult<StoreHandle> {
    open_store_in_memory(StoreKind::Live)
}

/// Opens a private in-memory log store.
pub fn open_log_store_in_memory() -> DbResult<StoreHandle> {
    open_store_in_memory(StoreKind::Log)
}

/// Opens a SQLite database file as a store of `kind`.
///
/// # Side effects
/// - Creates the file when missing and applies pending migrations.
/// - Emits `store_open` logging events with duration and status.
pub fn open_store(path: impl AsRef<Path>, kind: StoreKind) -> DbResult<StoreHandle> {
    let started_at = Instant::now();
    info!("event=store_open module=db status=start store={kind} mode=file");

    let result = open_file(path.as_ref(), kind);
    log_open_result(&result, kind, "file", started_at);
    result
}

/// Opens an in-memory SQLite database as a store of `kind`.
pub fn open_store_in_memory(kind: StoreKind) -> DbResult<StoreHandle> {
    let started_at = Instant::now();
    info!("event=store_open module=db status=start store={kind} mode=memory");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|conn| finish_open(conn, kind));
    log_open_result(&result, kind, "memory", started_at);
    result
}

fn open_file(path: &Path, kind: StoreKind) -> DbResult<StoreHandle> {
    let conn = Connection::open(path)?;
    // journal_mode returns the resulting mode as a row.
    let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    finish_open(conn, kind)
}

fn finish_open(mut conn: Connection, kind: StoreKind) -> DbResult<StoreHandle> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(&mut conn, kind)?;
    StoreHandle::new(conn, kind)
}

fn log_open_result(
    result: &DbResult<StoreHandle>,
    kind: StoreKind,
    mode: &str,
    started_at: Instant,
) {
    match result {
        Ok(_) => info!(
            "event=store_open module=db status=ok store={kind} mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=store_open module=db status=error store={kind} mode={mode} duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
