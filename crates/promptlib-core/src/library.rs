//! CRUD over the persisted record set.
//!
//! Every operation loads the full set, changes an in-memory copy and writes
//! the whole set back. A failed write leaves the stored set untouched.

use crate::error::LibraryError;
use crate::estimator::{estimate_tokens, looks_like_code};
use crate::metadata::{create_metadata, refresh_timestamp};
use crate::storage::{FileStore, KeyValueStore, PromptStore};
use crate::validate::{require_text, validate_fields, validate_record};
use log::{debug, info, warn};
use promptlib_config::{DEFAULT_STORAGE_KEY, PromptLibConfig};
use promptlib_protocol::{
    MODEL_MAX_LEN, Metadata, Note, PromptRecord, RATING_MAX, TITLE_MAX_LEN, UNKNOWN_MODEL,
    timestamp,
};
use std::sync::Arc;
use uuid::Uuid;

/// Words kept by [`preview`].
const PREVIEW_WORDS: usize = 12;

/// Input for [`PromptLibrary::add_prompt`].
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub title: String,
    pub content: String,
    pub model: String,
    /// `None` lets [`looks_like_code`] decide.
    pub is_code: Option<bool>,
}

/// Partial edit for [`PromptLibrary::update_prompt`]; `None` keeps a field.
#[derive(Debug, Clone, Default)]
pub struct PromptChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub model: Option<String>,
    pub is_code: Option<bool>,
}

/// Prompt library over an injected key-value store.
#[derive(Clone)]
pub struct PromptLibrary {
    store: PromptStore,
    backup_retention: usize,
}

impl PromptLibrary {
    /// Library using the default storage key.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store: PromptStore::new(store, key),
            backup_retention: promptlib_config::ImportConfig::default().backup_retention,
        }
    }

    /// Number of import backups kept; 0 keeps all of them.
    pub fn with_backup_retention(mut self, retain: usize) -> Self {
        self.backup_retention = retain;
        self
    }

    /// Library backed by a [`FileStore`] in the configured data directory.
    pub fn from_config(config: &PromptLibConfig) -> Result<Self, LibraryError> {
        let root = config.storage.data_dir();
        let store = FileStore::new(&root)?.with_quota(config.storage.quota_bytes);
        info!(
            "opened prompt library (root={}, key={})",
            root.display(),
            config.storage.key
        );
        Ok(Self::with_key(Arc::new(store), config.storage.key.clone())
            .with_backup_retention(config.import.backup_retention))
    }

    /// Accessor for the persisted record set.
    pub fn store(&self) -> &PromptStore {
        &self.store
    }

    pub(crate) fn backup_retention(&self) -> usize {
        self.backup_retention
    }

    /// Create and persist a new prompt, placed first.
    pub fn add_prompt(&self, input: NewPrompt) -> Result<PromptRecord, LibraryError> {
        let title = require_text(&input.title, "title", Some(TITLE_MAX_LEN))?;
        let content = require_text(&input.content, "content", None)?;
        let metadata = create_metadata(&input.model, &content, input.is_code)?;
        let record = PromptRecord {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            rating: 0,
            notes: Vec::new(),
            metadata: Some(metadata),
        };
        validate_record(&record)?;

        let mut records = self.store.load()?;
        records.insert(0, record.clone());
        self.store.save(&records)?;
        info!(
            "added prompt (id={}, model={}, total={})",
            record.id,
            record.model(),
            records.len()
        );
        Ok(record)
    }

    /// Remove a prompt; `false` when no record has that id.
    pub fn delete_prompt(&self, id: &str) -> Result<bool, LibraryError> {
        let mut records = self.store.load()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            debug!("delete skipped, prompt not found (id={id})");
            return Ok(false);
        }
        self.store.save(&records)?;
        info!("deleted prompt (id={id}, total={})", records.len());
        Ok(true)
    }

    /// Set the rating, clamping `value` into 0..=5.
    pub fn set_rating(&self, id: &str, value: i64) -> Result<Option<PromptRecord>, LibraryError> {
        let rating = value.clamp(0, i64::from(RATING_MAX)) as u8;
        self.mutate(id, |record| {
            record.rating = rating;
            Ok(record.clone())
        })
    }

    pub fn clear_rating(&self, id: &str) -> Result<Option<PromptRecord>, LibraryError> {
        self.set_rating(id, 0)
    }

    /// Attach a note, newest first.
    pub fn add_note(&self, id: &str, content: &str) -> Result<Option<Note>, LibraryError> {
        let content = require_text(content, "note content", None)?;
        self.mutate(id, |record| {
            let now = timestamp::now();
            let note = Note {
                id: Uuid::new_v4().to_string(),
                content,
                created_at: now,
                updated_at: now,
            };
            record.notes.insert(0, note.clone());
            Ok(note)
        })
    }

    /// Replace a note's text. `None` when the prompt or the note is missing.
    pub fn update_note(
        &self,
        id: &str,
        note_id: &str,
        content: &str,
    ) -> Result<Option<Note>, LibraryError> {
        let content = require_text(content, "note content", None)?;
        let updated = self.mutate_if(id, |record| {
            let Some(note) = record.notes.iter_mut().find(|note| note.id == note_id) else {
                return Ok(None);
            };
            note.content = content;
            note.updated_at = timestamp::now().max(note.created_at);
            Ok(Some(note.clone()))
        })?;
        Ok(updated.flatten())
    }

    /// Remove a note. `false` when the prompt or the note is missing.
    pub fn delete_note(&self, id: &str, note_id: &str) -> Result<bool, LibraryError> {
        let removed = self.mutate_if(id, |record| {
            let before = record.notes.len();
            record.notes.retain(|note| note.id != note_id);
            Ok((record.notes.len() != before).then_some(()))
        })?;
        Ok(removed.flatten().is_some())
    }

    /// Apply a partial edit, re-estimating tokens and keeping `createdAt`.
    pub fn update_prompt(
        &self,
        id: &str,
        changes: PromptChanges,
    ) -> Result<Option<PromptRecord>, LibraryError> {
        let mut records = self.store.load()?;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            debug!("update skipped, prompt not found (id={id})");
            return Ok(None);
        };

        let title = require_text(
            changes.title.as_deref().unwrap_or(&record.title),
            "title",
            Some(TITLE_MAX_LEN),
        )?;
        let content = require_text(
            changes.content.as_deref().unwrap_or(&record.content),
            "content",
            None,
        )?;
        let current_model = record
            .metadata
            .as_ref()
            .map(|metadata| metadata.model.clone())
            .unwrap_or_default();
        let model = require_text(
            changes.model.as_deref().unwrap_or(&current_model),
            "model",
            Some(MODEL_MAX_LEN),
        )?;
        let is_code = changes.is_code.unwrap_or_else(|| looks_like_code(&content));

        let mut metadata = match record.metadata.take() {
            Some(metadata) => metadata,
            None => create_metadata(&model, &content, Some(is_code))?,
        };
        metadata.model = model;
        metadata.token_estimate = estimate_tokens(&content, is_code);
        record.metadata = Some(refreshed(id, metadata));
        record.title = title;
        record.content = content;
        validate_record(record)?;

        let updated = record.clone();
        self.store.save(&records)?;
        info!("updated prompt (id={id})");
        Ok(Some(updated))
    }

    /// Find a prompt by id.
    pub fn get(&self, id: &str) -> Result<Option<PromptRecord>, LibraryError> {
        Ok(self
            .store
            .load()?
            .into_iter()
            .find(|record| record.id == id))
    }

    /// All prompts, newest `createdAt` first; legacy records last.
    pub fn list(&self) -> Result<Vec<PromptRecord>, LibraryError> {
        let mut records = self.store.load()?;
        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(records)
    }

    /// Persist synthesized metadata for records stored without it.
    ///
    /// Returns the number of migrated records.
    pub fn migrate_legacy(&self) -> Result<usize, LibraryError> {
        let mut records = self.store.load()?;
        let mut migrated = 0;
        for record in records.iter_mut().filter(|record| record.metadata.is_none()) {
            record.metadata = Some(synthesize_metadata(&record.content)?);
            migrated += 1;
        }
        if migrated > 0 {
            self.store.save(&records)?;
            info!("migrated legacy prompts (count={migrated})");
        }
        Ok(migrated)
    }

    /// Load, change one record, refresh its timestamp, validate and save.
    fn mutate<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut PromptRecord) -> Result<T, LibraryError>,
    ) -> Result<Option<T>, LibraryError> {
        self.mutate_if(id, |record| apply(record).map(Some))
            .map(Option::flatten)
    }

    /// Like [`Self::mutate`], but `apply` returning `Ok(None)` skips the write.
    fn mutate_if<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut PromptRecord) -> Result<Option<T>, LibraryError>,
    ) -> Result<Option<Option<T>>, LibraryError> {
        let mut records = self.store.load()?;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            debug!("mutation skipped, prompt not found (id={id})");
            return Ok(None);
        };
        let Some(output) = apply(record)? else {
            return Ok(Some(None));
        };
        touch(record);
        validate_stored(record)?;
        self.store.save(&records)?;
        debug!("saved prompt change (id={id})");
        Ok(Some(Some(output)))
    }
}

/// Metadata for a record that never had any.
pub(crate) fn synthesize_metadata(content: &str) -> Result<Metadata, LibraryError> {
    Ok(create_metadata(UNKNOWN_MODEL, content, None)?)
}

/// Refresh `updatedAt`; legacy records without metadata are left alone.
fn touch(record: &mut PromptRecord) {
    if let Some(metadata) = record.metadata.take() {
        record.metadata = Some(refreshed(&record.id, metadata));
    }
}

/// `metadata` with `updatedAt` moved to now, or unchanged when `createdAt`
/// lies in the future.
fn refreshed(id: &str, metadata: Metadata) -> Metadata {
    match refresh_timestamp(&metadata) {
        Ok(refreshed) => refreshed,
        Err(err) => {
            warn!("timestamp refresh skipped (id={id}): {err}");
            metadata
        }
    }
}

fn validate_stored(record: &PromptRecord) -> Result<(), LibraryError> {
    if record.metadata.is_some() {
        validate_record(record)?;
    } else {
        validate_fields(record)?;
    }
    Ok(())
}

/// First twelve words of `content`, with an ellipsis when truncated.
pub fn preview(content: &str) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.len() > PREVIEW_WORDS {
        format!("{}…", words[..PREVIEW_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}
