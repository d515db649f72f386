//! Health-screening domain model.
//!
//! # Responsibility
//! - Define the persisted document shape for live and log records.
//! - Define listing inputs/outputs shared by the query builder and facade.
//!
//! # Invariants
//! - A record's `id` is empty until the live store assigns it.
//! - `detail` is opaque: it is stored and returned without interpretation.

pub mod assessment;
pub mod list_query;
