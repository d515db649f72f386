//! Per-store schema migration registry and executor.
//!
//! # Responsibility
//! - Register migrations for the live and log stores separately.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic within each store kind.
//! - Applied migration version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult, StoreKind};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const LIVE_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_live_init.sql"),
}];

const LOG_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_log_init.sql"),
}];

fn migrations_for(kind: StoreKind) -> &'static [Migration] {
    match kind {
        StoreKind::Live => LIVE_MIGRATIONS,
        StoreKind::Log => LOG_MIGRATIONS,
    }
}

/// Returns the latest migration version known for `kind`.
pub fn latest_version(kind: StoreKind) -> u32 {
    migrations_for(kind)
        .last()
        .map_or(0, |migration| migration.version)
}

/// Applies all pending migrations for `kind` on the provided connection.
pub fn apply_migrations(conn: &mut Connection, kind: StoreKind) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version(kind);

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            kind,
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in migrations_for(kind) {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
