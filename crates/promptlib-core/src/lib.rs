//! Core prompt library primitives.
//!
//! This crate owns the token estimator, metadata tracking, record validation,
//! the key-value storage layer, CRUD over the record set, and the
//! import/export engine used by the CLI.

pub mod error;
pub mod estimator;
pub mod library;
pub mod metadata;
pub mod storage;
pub mod transfer;
pub mod validate;

/// Error types for validation, storage and library operations.
pub use error::{LibraryError, StorageError, ValidationError};
/// Token estimation heuristics.
pub use estimator::{estimate_tokens, looks_like_code};
/// Record CRUD facade.
pub use library::{NewPrompt, PromptChanges, PromptLibrary, preview};
/// Metadata construction and timestamp refresh.
pub use metadata::{create_metadata, refresh_timestamp};
/// Key-value stores and the record set accessor.
pub use storage::{BackupInfo, FileStore, KeyValueStore, MemoryStore, PromptStore};
/// Import/export engine.
pub use transfer::{
    DuplicateResolver, FixedResolver, ImportReport, compute_stats, export_file_name,
};
/// Record validation.
pub use validate::validate_record;
