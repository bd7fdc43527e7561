//! Domain error model and the client-facing error list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::JobId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// These are programming/contract failures (bad identifiers, illegal state
/// transitions). Problems with client input are reported as [`ErrorEntry`]
/// values instead, so that one response can list all of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A lifecycle invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

/// Stable error codes reported to clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// `Content-Type` header missing or not the JSON:API media type.
    #[serde(rename = "1001")]
    ContentType,
    /// `Accept` header does not allow the JSON:API media type.
    #[serde(rename = "1002")]
    Accept,
    /// Request body could not be decoded.
    #[serde(rename = "2001")]
    BodyDecode,
    /// An attribute is present but its value is not allowed.
    #[serde(rename = "3001")]
    InvalidAttribute,
    /// An attribute required to build the map is missing.
    #[serde(rename = "3002")]
    MissingAttribute,
    /// The document `type` is not `maps`.
    #[serde(rename = "3003")]
    DocumentType,
    /// The job id is not a valid UUID.
    #[serde(rename = "4001")]
    MalformedId,
    /// No job exists for the id.
    #[serde(rename = "4002")]
    NotFound,
    /// The metadata can no longer be changed.
    #[serde(rename = "4003")]
    MetadataLocked,
    /// Internal failure; details are logged server side.
    #[serde(rename = "9001")]
    Internal,
    /// Response document could not be serialized.
    #[serde(rename = "9002")]
    Serialization,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ContentType => "1001",
            ErrorCode::Accept => "1002",
            ErrorCode::BodyDecode => "2001",
            ErrorCode::InvalidAttribute => "3001",
            ErrorCode::MissingAttribute => "3002",
            ErrorCode::DocumentType => "3003",
            ErrorCode::MalformedId => "4001",
            ErrorCode::NotFound => "4002",
            ErrorCode::MetadataLocked => "4003",
            ErrorCode::Internal => "9001",
            ErrorCode::Serialization => "9002",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem found while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: ErrorCode,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,
}

impl ErrorEntry {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Ordered list of problems. Empty means the request is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    errors: Vec<ErrorEntry>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ErrorEntry) {
        self.errors.push(entry);
    }

    pub fn append(&mut self, code: ErrorCode, detail: impl Into<String>) {
        self.push(ErrorEntry::new(code, detail));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// `Ok(())` when nothing was reported, otherwise the list itself.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ErrorEntry> for ErrorList {
    fn from(entry: ErrorEntry) -> Self {
        Self {
            errors: vec![entry],
        }
    }
}

impl core::fmt::Display for ErrorList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.code, e.detail)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_preserves_insertion_order() {
        let mut list = ErrorList::new();
        list.append(ErrorCode::Accept, "second header");
        list.append(ErrorCode::ContentType, "first header");

        let codes: Vec<_> = list.entries().iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::Accept, ErrorCode::ContentType]);
    }

    #[test]
    fn serializes_as_errors_envelope() {
        let id = JobId::from_uuid(uuid::Uuid::nil());
        let mut list = ErrorList::new();
        list.push(ErrorEntry::new(ErrorCode::NotFound, "requested ID not found").with_id(id));
        list.append(ErrorCode::BodyDecode, "eof");

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["errors"][0]["code"], "4002");
        assert_eq!(json["errors"][0]["id"], id.to_string());
        assert_eq!(json["errors"][1]["code"], "2001");
        assert!(json["errors"][1].get("id").is_none());
    }

    #[test]
    fn into_result_is_ok_only_when_empty() {
        assert!(ErrorList::new().into_result().is_ok());
        let list: ErrorList = ErrorEntry::new(ErrorCode::MalformedId, "bad").into();
        assert_eq!(list.into_result().unwrap_err().len(), 1);
    }
}
