//! Entry points for core callers.
//!
//! # Responsibility
//! - Expose the data access facade used by upstream service/API layers.
//! - Keep callers decoupled from SQLite and document encoding details.

pub mod data_access;
