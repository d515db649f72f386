//! Health assessment record and audit metadata.
//!
//! # Responsibility
//! - Define [`HealthAssessment`], the root document of the live store.
//! - Define [`Audit`], the mutation metadata embedded in logged snapshots.
//! - Validate document keys before they reach a store.
//!
//! # Invariants
//! - Serialized field names match the persisted document shape
//!   (`_key`, `data`, `audit`, `curr_no`, `inputterName`, `log_reason`).
//! - An empty `id` is never serialized as `_key`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum document key length in bytes.
pub const MAX_KEY_BYTES: usize = 254;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-:.@()+,=;$!*'%]+$").expect("document key pattern is valid")
});

/// Root record: one health-screening submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Store-assigned identity. Empty before the first create.
    #[serde(rename = "_key", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub data: AssessmentData,
    /// Present only when the record is submitted as part of an audited
    /// mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Audit>,
}

/// Screening payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentData {
    pub status: String,
    /// Arbitrary structured content, persisted verbatim.
    #[serde(default)]
    pub detail: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Mutation metadata for one audited change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Audit {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Per-record sequence number, assigned by the caller.
    #[serde(rename = "curr_no")]
    pub curr_no: u32,
    pub inputter: String,
    #[serde(
        rename = "inputterName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inputter_name: Option<String>,
    /// Submission time.
    pub datetime: String,
    /// Effective time, when different from `datetime`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputtime: Option<String>,
    #[serde(
        rename = "log_reason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub log_reason: Option<String>,
}

impl HealthAssessment {
    /// Creates an unsaved record with the given status and detail payload.
    pub fn new(status: impl Into<String>, detail: Value) -> Self {
        Self {
            id: String::new(),
            data: AssessmentData {
                status: status.into(),
                detail,
                date: None,
            },
            audit: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.data.date = Some(date.into());
        self
    }

    pub fn with_audit(mut self, audit: Audit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Whether the live store has assigned an identity yet.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

impl Audit {
    /// Creates audit metadata for sequence `curr_no` by `inputter`.
    pub fn new(curr_no: u32, inputter: impl Into<String>, datetime: impl Into<String>) -> Self {
        Self {
            curr_no,
            inputter: inputter.into(),
            datetime: datetime.into(),
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.log_reason = Some(reason.into());
        self
    }
}

/// Rejection reason for a malformed document key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("document key is empty")]
    Empty,
    #[error("document key is {0} bytes, max is {max}", max = MAX_KEY_BYTES)]
    TooLong(usize),
    #[error("document key `{0}` contains unsupported characters")]
    InvalidCharacters(String),
}

/// Checks that `key` is usable as a document identity.
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(KeyError::TooLong(key.len()));
    }
    if !KEY_PATTERN.is_match(key) {
        return Err(KeyError::InvalidCharacters(key.to_string()));
    }
    Ok(())
}
