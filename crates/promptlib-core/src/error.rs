//! Error types for the prompt library core.

use thiserror::Error;

/// A record, note or metadata block violates an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    #[error("{field} is required")]
    Empty { field: &'static str },
    /// Text field exceeds its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    /// Rating outside 0..=5.
    #[error("rating must be between 0 and 5 (got {0})")]
    RatingOutOfRange(u8),
    /// A note of the record is invalid.
    #[error("note {index}: {source}")]
    Note {
        index: usize,
        source: Box<ValidationError>,
    },
    /// Record carries no metadata block.
    #[error("metadata is missing")]
    MissingMetadata,
    /// Token estimate lower bound exceeds its upper bound.
    #[error("token estimate min ({min}) exceeds max ({max})")]
    TokenRange { min: u64, max: u64 },
    /// `updatedAt` precedes `createdAt`.
    #[error("updatedAt cannot be earlier than createdAt")]
    TimestampOrder,
    /// Raw JSON does not decode into a record.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Failures of the key-value storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Writing the value would exceed the store's quota.
    #[error("storage quota exceeded (key={key}, required={required}, quota={quota})")]
    QuotaExceeded {
        key: String,
        required: u64,
        quota: u64,
    },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The store cannot be used.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by library, import and export operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Import document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    /// Import document has the wrong shape.
    #[error("invalid import file: {0}")]
    InvalidPayload(String),
    #[error("unsupported export version: {0}")]
    UnsupportedVersion(String),
    /// An incoming record failed decoding or validation.
    #[error("invalid prompt at index {index}: {source}")]
    InvalidRecord {
        index: usize,
        source: ValidationError,
    },
    #[error("duplicate prompt id in import file: {0}")]
    DuplicateIncomingId(String),
    #[error("backup not found: {0}")]
    BackupNotFound(String),
    /// Saving failed and restoring the pre-import snapshot failed as well.
    #[error("import failed ({original}) and restoring backup {backup_key} failed ({restore})")]
    Rollback {
        backup_key: String,
        original: StorageError,
        restore: StorageError,
    },
    /// Writing an export file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
