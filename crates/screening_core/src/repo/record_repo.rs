//! Live record store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/delete/replace over the `health_assessment`
//!   collection.
//! - Expose listing through the shared query builder.
//!
//! # Invariants
//! - Identities are assigned here on create and never rewritten afterwards.
//! - Replace overwrites the whole document; nothing is merged.
//! - Delete returns the removed document in the same round trip.

use crate::context::OpContext;
use crate::db::{DbError, DbResult, StoreHandle, StoreKind};
use crate::error::{read_error, write_error, DataError, DataResult};
use crate::model::assessment::HealthAssessment;
use crate::model::list_query::{ListQuery, ListResult};
use crate::repo::{decode_document, encode_document, ensure_key, log_outcome, query};
use rusqlite::{params, OptionalExtension};
use std::time::Instant;
use uuid::Uuid;

const MODULE: &str = "record_store";

/// Data access contract for live health assessment records.
pub trait RecordStore {
    /// Inserts `record` under a freshly assigned identity and returns the
    /// stored state.
    fn create(&self, ctx: &OpContext, record: &HealthAssessment) -> DataResult<HealthAssessment>;
    /// Point lookup by identity.
    fn get_by_id(&self, ctx: &OpContext, id: &str) -> DataResult<HealthAssessment>;
    /// Removes the record and returns its prior state, or `None` when no
    /// record matched.
    fn delete_by_id(&self, ctx: &OpContext, id: &str) -> DataResult<Option<HealthAssessment>>;
    /// Overwrites the record identified by `record.id`.
    fn replace(&self, ctx: &OpContext, record: &HealthAssessment)
        -> DataResult<HealthAssessment>;
    /// Returns one page of matching records plus the total match count.
    fn list(&self, ctx: &OpContext, query: &ListQuery) -> DataResult<ListResult>;
}

/// SQLite-backed live record store.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    store: StoreHandle,
}

impl SqliteRecordStore {
    /// Binds the record store to a live store handle.
    pub fn try_new(store: StoreHandle) -> DbResult<Self> {
        if store.kind() != StoreKind::Live {
            return Err(DbError::WrongStoreKind {
                expected: StoreKind::Live,
                actual: store.kind(),
            });
        }
        Ok(Self { store })
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&self, ctx: &OpContext, record: &HealthAssessment) -> DataResult<HealthAssessment> {
        const OP: &str = "create";
        let started_at = Instant::now();

        let mut stored = record.clone();
        stored.id = new_record_key();

        let result = encode_document(OP, &stored).and_then(|document| {
            self.store.run(ctx, OP, |conn| {
                conn.execute(
                    "INSERT INTO health_assessment (doc_key, document) VALUES (?1, ?2);",
                    params![stored.id, document],
                )
                .map_err(|err| write_error(ctx, OP, &stored.id, err))?;
                Ok(())
            })
        });

        log_outcome(MODULE, OP, &stored.id, started_at, &result);
        result.map(|()| stored)
    }

    fn get_by_id(&self, ctx: &OpContext, id: &str) -> DataResult<HealthAssessment> {
        const OP: &str = "get_by_id";
        let started_at = Instant::now();

        let result = ensure_key(OP, id).and_then(|()| {
            self.store.run(ctx, OP, |conn| {
                let document: Option<String> = conn
                    .query_row(
                        "SELECT document FROM health_assessment WHERE doc_key = ?1;",
                        [id],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|err| read_error(ctx, OP, err))?;

                match document {
                    Some(document) => decode_document(id, &document),
                    None => Err(DataError::NotFound {
                        operation: OP,
                        id: id.to_string(),
                    }),
                }
            })
        });

        log_outcome(MODULE, OP, id, started_at, &result);
        result
    }

    fn delete_by_id(&self, ctx: &OpContext, id: &str) -> DataResult<Option<HealthAssessment>> {
        const OP: &str = "delete_by_id";
        let started_at = Instant::now();

        let result = ensure_key(OP, id).and_then(|()| {
            self.store.run(ctx, OP, |conn| {
                let mut stmt = conn
                    .prepare(
                        "DELETE FROM health_assessment WHERE doc_key = ?1 RETURNING document;",
                    )
                    .map_err(|err| write_error(ctx, OP, id, err))?;
                let mut rows = stmt
                    .query([id])
                    .map_err(|err| write_error(ctx, OP, id, err))?;

                let mut removed = None;
                while let Some(row) = rows.next().map_err(|err| write_error(ctx, OP, id, err))? {
                    let document: String =
                        row.get(0).map_err(|err| write_error(ctx, OP, id, err))?;
                    removed = Some(document);
                }

                removed
                    .map(|document| decode_document(id, &document))
                    .transpose()
            })
        });

        log_outcome(MODULE, OP, id, started_at, &result);
        result
    }

    fn replace(
        &self,
        ctx: &OpContext,
        record: &HealthAssessment,
    ) -> DataResult<HealthAssessment> {
        const OP: &str = "replace";
        let started_at = Instant::now();
        let id = record.id.as_str();

        let result = ensure_key(OP, id)
            .and_then(|()| encode_document(OP, record))
            .and_then(|document| {
                self.store.run(ctx, OP, |conn| {
                    let changed = conn
                        .execute(
                            "UPDATE health_assessment
                             SET
                                document = ?2,
                                updated_at = (strftime('%s', 'now') * 1000)
                             WHERE doc_key = ?1;",
                            params![id, document],
                        )
                        .map_err(|err| write_error(ctx, OP, id, err))?;

                    if changed == 0 {
                        return Err(DataError::NotFound {
                            operation: OP,
                            id: id.to_string(),
                        });
                    }
                    Ok(())
                })
            });

        log_outcome(MODULE, OP, id, started_at, &result);
        result.map(|()| record.clone())
    }

    fn list(&self, ctx: &OpContext, query: &ListQuery) -> DataResult<ListResult> {
        query::execute_list(&self.store, ctx, query)
    }
}

fn new_record_key() -> String {
    Uuid::new_v4().simple().to_string()
}
