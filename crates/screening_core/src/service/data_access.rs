//! Data access facade over the live and log stores.
//!
//! # Responsibility
//! - Provide the single typed entry point for record CRUD, listing and
//!   audit logging.
//! - Own both store handles for the facade's lifetime.
//!
//! # Invariants
//! - No business rules live here: each call maps to exactly one repository
//!   call. Mutations are never logged implicitly.
//! - A failed `save_log` after a successful mutation leaves the mutation in
//!   place; callers decide how to report it.

use crate::context::OpContext;
use crate::db::{DbResult, StoreHandle};
use crate::error::DataResult;
use crate::model::assessment::HealthAssessment;
use crate::model::list_query::{ListQuery, ListResult};
use crate::repo::audit_repo::{AuditLog, LogEntry, SqliteAuditLog};
use crate::repo::record_repo::{RecordStore, SqliteRecordStore};

/// Facade composing a record store and an audit log.
pub struct DataAccess<R: RecordStore, A: AuditLog> {
    records: R,
    audit: A,
}

impl DataAccess<SqliteRecordStore, SqliteAuditLog> {
    /// Builds the SQLite-backed facade from the live and log store handles.
    ///
    /// # Errors
    /// - `WrongStoreKind` when the handles are swapped.
    pub fn open(live: StoreHandle, log: StoreHandle) -> DbResult<Self> {
        Ok(Self::new(
            SqliteRecordStore::try_new(live)?,
            SqliteAuditLog::try_new(log)?,
        ))
    }
}

impl<R: RecordStore, A: AuditLog> DataAccess<R, A> {
    pub fn new(records: R, audit: A) -> Self {
        Self { records, audit }
    }

    /// Persists a new record; the returned record carries its identity.
    pub fn create(
        &self,
        ctx: &OpContext,
        record: &HealthAssessment,
    ) -> DataResult<HealthAssessment> {
        self.records.create(ctx, record)
    }

    /// Removes a record and returns what was removed, if anything.
    pub fn delete_by_key(
        &self,
        ctx: &OpContext,
        id: &str,
    ) -> DataResult<Option<HealthAssessment>> {
        self.records.delete_by_id(ctx, id)
    }

    pub fn get_by_key(&self, ctx: &OpContext, id: &str) -> DataResult<HealthAssessment> {
        self.records.get_by_id(ctx, id)
    }

    pub fn list(&self, ctx: &OpContext, query: &ListQuery) -> DataResult<ListResult> {
        self.records.list(ctx, query)
    }

    /// Appends a snapshot of `record` to the audit log and returns its key.
    pub fn save_log(&self, ctx: &OpContext, record: &HealthAssessment) -> DataResult<String> {
        self.audit.save_log(ctx, record)
    }

    /// Replaces the stored record with `record` in full.
    pub fn update(
        &self,
        ctx: &OpContext,
        record: &HealthAssessment,
    ) -> DataResult<HealthAssessment> {
        self.records.replace(ctx, record)
    }

    pub fn log_history(&self, ctx: &OpContext, record_id: &str) -> DataResult<Vec<LogEntry>> {
        self.audit.history(ctx, record_id)
    }
}
