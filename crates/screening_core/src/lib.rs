//! Data access core for health-screening submissions.
//! Owns record CRUD, listing/search and the append-only audit log.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use context::{CancelToken, InterruptReason, OpContext};
pub use db::{DbError, DbResult, StoreHandle, StoreKind};
pub use error::{DataError, DataResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::assessment::{AssessmentData, Audit, HealthAssessment};
pub use model::list_query::{Filter, ListQuery, ListResult, Search};
pub use repo::audit_repo::{log_key, AuditLog, LogEntry, SqliteAuditLog};
pub use repo::record_repo::{RecordStore, SqliteRecordStore};
pub use service::data_access::DataAccess;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
