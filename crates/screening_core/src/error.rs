//! Data-access error taxonomy.
//!
//! # Responsibility
//! - Define the one error type returned by record store, query builder,
//!   audit logger and facade operations.
//! - Classify raw SQLite failures into store-level vs write-level vs
//!   query-level errors with operation/key context attached.
//!
//! # Invariants
//! - `Validation` is only produced before any store call is attempted.
//! - Underlying SQLite causes are preserved as `source` for write and query
//!   failures.

use crate::context::{InterruptReason, OpContext};
use rusqlite::ErrorCode;

pub type DataResult<T> = Result<T, DataError>;

/// Error returned by every data-access operation.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        operation: &'static str,
        reason: String,
    },
    #[error("{operation}: no document with key `{id}`")]
    NotFound { operation: &'static str, id: String },
    #[error("{operation}: store rejected write for key `{key}`: {source}")]
    WriteFailure {
        operation: &'static str,
        key: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("{operation}: invalid input: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },
    #[error("query failed `{query}`: {source}")]
    QueryExecution {
        query: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("{operation} interrupted: {reason}")]
    Interrupted {
        operation: &'static str,
        reason: InterruptReason,
    },
    #[error("invalid persisted document `{key}`: {message}")]
    InvalidData { key: String, message: String },
}

impl DataError {
    pub(crate) fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            message: message.into(),
        }
    }

    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::NotFound { .. } => "not_found",
            Self::WriteFailure { .. } => "write_failure",
            Self::Validation { .. } => "validation",
            Self::QueryExecution { .. } => "query_execution",
            Self::Interrupted { .. } => "interrupted",
            Self::InvalidData { .. } => "invalid_data",
        }
    }
}

/// Maps a failure raised while reading from a store.
pub(crate) fn read_error(
    ctx: &OpContext,
    operation: &'static str,
    err: rusqlite::Error,
) -> DataError {
    match classify(&err) {
        FailureClass::Interrupted => interrupted(ctx, operation),
        FailureClass::Unavailable | FailureClass::Other => DataError::StoreUnavailable {
            operation,
            reason: err.to_string(),
        },
    }
}

/// Maps a failure raised while inserting, replacing or removing a document.
pub(crate) fn write_error(
    ctx: &OpContext,
    operation: &'static str,
    key: &str,
    err: rusqlite::Error,
) -> DataError {
    match classify(&err) {
        FailureClass::Interrupted => interrupted(ctx, operation),
        FailureClass::Unavailable => DataError::StoreUnavailable {
            operation,
            reason: err.to_string(),
        },
        FailureClass::Other => DataError::WriteFailure {
            operation,
            key: key.to_string(),
            source: err,
        },
    }
}

/// Maps a failure raised while preparing or stepping a list/count query.
pub(crate) fn query_error(
    ctx: &OpContext,
    operation: &'static str,
    query: &str,
    err: rusqlite::Error,
) -> DataError {
    match classify(&err) {
        FailureClass::Interrupted => interrupted(ctx, operation),
        FailureClass::Unavailable => DataError::StoreUnavailable {
            operation,
            reason: err.to_string(),
        },
        FailureClass::Other => DataError::QueryExecution {
            query: query.to_string(),
            source: err,
        },
    }
}

pub(crate) fn interrupted(ctx: &OpContext, operation: &'static str) -> DataError {
    DataError::Interrupted {
        operation,
        reason: ctx
            .interrupt_reason()
            .unwrap_or(InterruptReason::Cancelled),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureClass {
    Unavailable,
    Interrupted,
    Other,
}

fn classify(err: &rusqlite::Error) -> FailureClass {
    match err {
        rusqlite::Error::SqliteFailure(inner, message) => match inner.code {
            ErrorCode::OperationInterrupted => FailureClass::Interrupted,
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::PermissionDenied
            | ErrorCode::OutOfMemory => FailureClass::Unavailable,
            // A missing collection table means the store is not reachable
            // as a collection, not that the statement was malformed.
            _ if message
                .as_deref()
                .is_some_and(|msg| msg.starts_with("no such table")) =>
            {
                FailureClass::Unavailable
            }
            _ => FailureClass::Other,
        },
        _ => FailureClass::Other,
    }
}
