//! Repository layer over the live and log stores.
//!
//! # Responsibility
//! - Define data access contracts for live records and audit snapshots.
//! - Isolate SQL and JSON document details from the facade.
//!
//! # Invariants
//! - Input validation happens before any store call.
//! - Every operation emits one metadata-only outcome event; payload contents
//!   are never logged.

use crate::error::{DataError, DataResult};
use crate::model::assessment::{validate_key, HealthAssessment};
use log::{error, info, warn};
use std::time::Instant;

pub mod audit_repo;
pub mod query;
pub mod record_repo;

pub(crate) fn ensure_key(operation: &'static str, key: &str) -> DataResult<()> {
    validate_key(key).map_err(|err| DataError::validation(operation, err.to_string()))
}

pub(crate) fn encode_document(
    operation: &'static str,
    record: &HealthAssessment,
) -> DataResult<String> {
    serde_json::to_string(record).map_err(|err| {
        DataError::validation(operation, format!("record is not serializable: {err}"))
    })
}

/// Decodes a stored document; the store key always wins over `_key` in the
/// document body.
pub(crate) fn decode_document(key: &str, document: &str) -> DataResult<HealthAssessment> {
    let mut record: HealthAssessment =
        serde_json::from_str(document).map_err(|err| DataError::InvalidData {
            key: key.to_string(),
            message: err.to_string(),
        })?;
    record.id = key.to_string();
    Ok(record)
}

pub(crate) fn log_outcome<T>(
    module: &str,
    operation: &str,
    key: &str,
    started_at: Instant,
    result: &DataResult<T>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={operation} module={module} status=ok key={key} duration_ms={duration_ms}"
        ),
        Err(err @ (DataError::NotFound { .. } | DataError::Validation { .. })) => warn!(
            "event={operation} module={module} status=rejected key={key} duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
        Err(err) => error!(
            "event={operation} module={module} status=error key={key} duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
    }
}
