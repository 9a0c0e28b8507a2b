//! Metadata construction and timestamp maintenance.

use crate::error::ValidationError;
use crate::estimator::{estimate_tokens, looks_like_code};
use crate::validate::require_text;
use chrono::{DateTime, Utc};
use promptlib_protocol::{MODEL_MAX_LEN, Metadata, timestamp};

/// Build metadata for freshly written content.
///
/// `is_code` of `None` falls back to [`looks_like_code`].
pub fn create_metadata(
    model: &str,
    content: &str,
    is_code: Option<bool>,
) -> Result<Metadata, ValidationError> {
    create_metadata_at(model, content, is_code, timestamp::now())
}

/// [`create_metadata`] with an explicit creation instant.
pub fn create_metadata_at(
    model: &str,
    content: &str,
    is_code: Option<bool>,
    now: DateTime<Utc>,
) -> Result<Metadata, ValidationError> {
    let model = require_text(model, "model", Some(MODEL_MAX_LEN))?;
    let is_code = is_code.unwrap_or_else(|| looks_like_code(content));
    Ok(Metadata {
        model,
        created_at: now,
        updated_at: now,
        token_estimate: estimate_tokens(content, is_code),
    })
}

/// Copy of `metadata` with `updatedAt` moved to now.
pub fn refresh_timestamp(metadata: &Metadata) -> Result<Metadata, ValidationError> {
    refresh_timestamp_at(metadata, timestamp::now())
}

/// [`refresh_timestamp`] with an explicit update instant.
pub fn refresh_timestamp_at(
    metadata: &Metadata,
    now: DateTime<Utc>,
) -> Result<Metadata, ValidationError> {
    if now < metadata.created_at {
        return Err(ValidationError::TimestampOrder);
    }
    Ok(Metadata {
        updated_at: now,
        ..metadata.clone()
    })
}
