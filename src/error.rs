//! Error types for curriculum authoring
//!
//! Collaborator failures are normalized into [`StoreError`] at the client
//! boundary. The pipeline then reports them through [`ProvisioningError`],
//! which carries the three failure kinds a caller has to distinguish:
//! validation, parent creation, and child provisioning.

use std::fmt;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Normalized error from the course-content store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Record with the same id already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Request never produced a response (connect, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Map a non-success HTTP status and body onto the taxonomy
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => StoreError::Unauthorized(message),
            403 => StoreError::Forbidden(message),
            404 => StoreError::NotFound(message),
            409 => StoreError::Conflict(message),
            _ => StoreError::Server { status, message },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return StoreError::InvalidResponse(err.to_string());
        }
        match err.status() {
            Some(status) => StoreError::from_status(status.as_u16(), err.to_string()),
            None => StoreError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::InvalidResponse(err.to_string())
    }
}

/// Where a duplicate identifier was already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateOrigin {
    /// Staged earlier in the same pipeline run
    Pending,
    /// Already persisted in the content store
    Store,
}

impl fmt::Display for DuplicateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateOrigin::Pending => write!(f, "in this upload"),
            DuplicateOrigin::Store => write!(f, "in the content store"),
        }
    }
}

/// Local validation failure, always reported before any side effect
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Identifier '{identifier}' does not match {expected}")]
    InvalidFormat {
        identifier: String,
        expected: &'static str,
    },

    #[error("File '{name}' must be a PDF or MP3")]
    UnsupportedFileType { name: String },

    #[error("File '{name}' is {size} bytes, limit is {limit}")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Identifier '{identifier}' already exists {origin}")]
    DuplicateIdentifier {
        identifier: String,
        origin: DuplicateOrigin,
    },

    #[error("At least one material with a skill and a file is required")]
    NoMaterials,
}

/// A validation error tied to the draft that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftError {
    /// Index of the draft in the caller's list (None for run-level errors)
    pub index: Option<usize>,
    pub error: ValidationError,
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "material[{}]: {}", i, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Which half of a child's provisioning failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStep {
    Upload,
    Register,
}

impl fmt::Display for ChildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildStep::Upload => write!(f, "upload"),
            ChildStep::Register => write!(f, "register"),
        }
    }
}

/// Failure of a provisioning run
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    /// One or more drafts were rejected locally, nothing was sent
    #[error("Validation failed: {}", join_draft_errors(.0))]
    Validation(Vec<DraftError>),

    /// The unit could not be created, no materials were attempted
    #[error("Unit creation failed: {0}")]
    ParentCreation(StoreError),

    /// A material failed; earlier materials and the unit remain
    #[error("Material {step} failed: {source}")]
    ChildProvisioning { step: ChildStep, source: StoreError },
}

fn join_draft_errors(errors: &[DraftError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StoreError::from_status(401, "no token"),
            StoreError::Unauthorized("no token".into())
        );
        assert_eq!(
            StoreError::from_status(403, "nope"),
            StoreError::Forbidden("nope".into())
        );
        assert!(StoreError::from_status(404, "").is_not_found());
        assert_eq!(
            StoreError::from_status(409, "exists"),
            StoreError::Conflict("exists".into())
        );
        assert_eq!(
            StoreError::from_status(502, "bad gateway"),
            StoreError::Server { status: 502, message: "bad gateway".into() }
        );
    }

    #[test]
    fn test_validation_message_lists_drafts() {
        let err = ProvisioningError::Validation(vec![
            DraftError {
                index: Some(0),
                error: ValidationError::UnsupportedFileType { name: "a.txt".into() },
            },
            DraftError { index: None, error: ValidationError::NoMaterials },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("material[0]: File 'a.txt' must be a PDF or MP3"));
        assert!(msg.contains("At least one material"));
    }
}
