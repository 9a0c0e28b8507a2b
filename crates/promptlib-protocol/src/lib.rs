//! Data model shared by the prompt library crates.
//!
//! Field names serialize in camelCase so stored blobs and export files keep
//! the layout used by earlier versions of the library.

pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a prompt record.
pub type PromptId = String;
/// Unique identifier for a note.
pub type NoteId = String;

/// The only export format version this library reads and writes.
pub const EXPORT_VERSION: u32 = 1;
/// Highest allowed rating; 0 means unrated.
pub const RATING_MAX: u8 = 5;
/// Maximum title length in UTF-16 code units.
pub const TITLE_MAX_LEN: usize = 120;
/// Maximum model name length in UTF-16 code units.
pub const MODEL_MAX_LEN: usize = 100;
/// Model name used when metadata has to be synthesized for a legacy record.
pub const UNKNOWN_MODEL: &str = "Unknown";

/// A saved prompt with its rating, notes and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    #[serde(default)]
    pub id: PromptId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// 0 to 5; 0 means unrated.
    #[serde(default)]
    pub rating: u8,
    /// Newest first.
    #[serde(default)]
    pub notes: Vec<Note>,
    /// Absent only on records written before metadata tracking existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl PromptRecord {
    /// Creation time used for ordering; `None` for legacy records.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.as_ref().map(|metadata| metadata.created_at)
    }

    /// Model name, or `Unknown` when the record has no metadata.
    pub fn model(&self) -> &str {
        self.metadata
            .as_ref()
            .map_or(UNKNOWN_MODEL, |metadata| metadata.model.as_str())
    }

    /// Find a note by id.
    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }
}

/// A free-form annotation attached to a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub id: NoteId,
    #[serde(default)]
    pub content: String,
    #[serde(with = "timestamp::lenient")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp::lenient")]
    pub updated_at: DateTime<Utc>,
}

/// Model name, timestamps and token estimate of a prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub model: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    pub token_estimate: TokenEstimate,
}

/// Heuristic token count range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenEstimate {
    pub min: u64,
    pub max: u64,
    pub confidence: Confidence,
}

/// How far a token estimate can be trusted; larger texts drift more.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary figures included in every export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    pub total_prompts: usize,
    /// Mean rating rounded to two decimals.
    pub average_rating: f64,
    pub most_used_model: String,
}

/// Document written by export and read back by import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub version: u32,
    #[serde(with = "timestamp")]
    pub export_timestamp: DateTime<Utc>,
    pub stats: ExportStats,
    pub prompts: Vec<PromptRecord>,
}

/// Strategy for combining imported records with the stored ones.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Union by id with the existing records.
    #[default]
    Merge,
    /// Discard existing records entirely.
    Replace,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Merge => "merge",
            ImportMode::Replace => "replace",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single answer applied to every id collision of one merge import.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the stored record, ignore the incoming one.
    Keep,
    /// Replace the stored record with the incoming one.
    Overwrite,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Keep => f.write_str("keep"),
            DuplicatePolicy::Overwrite => f.write_str("overwrite"),
        }
    }
}
