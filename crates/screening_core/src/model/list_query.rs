//! Listing inputs and outputs.
//!
//! # Invariants
//! - `offset`/`limit` drive the page window; `page` is informational.
//! - `limit == 0` means an empty page, never "unlimited".

use crate::model::assessment::HealthAssessment;
use serde::{Deserialize, Serialize};

/// Parameters for one listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Direct key lookup; when set, `filter` and `search` are ignored.
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub search: Search,
}

/// Structured predicates over the record payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// `[lower, upper]` inclusive bounds on `data.date`.
    #[serde(rename = "dateAge", default, skip_serializing_if = "Vec::is_empty")]
    pub date_age: Vec<String>,
    /// `[min, max]` inclusive bounds on `data.detail.age`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub age: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rapid: Option<String>,
}

/// Free-text predicate, matched case-insensitively against `data.status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    #[serde(default)]
    pub text: String,
}

/// One page of records plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    /// Records in insertion order.
    pub items: Vec<HealthAssessment>,
    /// Matches for the same predicate, ignoring the page window.
    pub total_count: u64,
}

impl ListQuery {
    /// Unfiltered window of `limit` records starting at `offset`.
    pub fn window(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search.text = text.into();
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key_id = Some(key.into());
        self
    }
}
