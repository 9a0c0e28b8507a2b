//! Key-value storage and the accessor for the persisted record set.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use promptlib_protocol::{PromptRecord, timestamp};
use serde_json::Value;
use std::sync::Arc;

/// String key-value store holding the serialized record set and its backups.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Remove a key; removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// All keys currently stored.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// A pre-import snapshot of the record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub key: String,
    pub created_at: DateTime<Utc>,
}

/// Reads and writes the record array stored under one key.
#[derive(Clone)]
pub struct PromptStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl PromptStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the record set.
    ///
    /// Missing or unparseable data yields an empty list; entries that do not
    /// decode as records are dropped with a warning.
    pub fn load(&self) -> Result<Vec<PromptRecord>, StorageError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };
        Ok(parse_records(&raw, &self.key))
    }

    /// Persist the whole record set.
    pub fn save(&self, records: &[PromptRecord]) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(records)?;
        self.store.set(&self.key, &serialized)?;
        debug!(
            "saved prompt records (key={}, count={}, bytes={})",
            self.key,
            records.len(),
            serialized.len()
        );
        Ok(())
    }

    /// Snapshot the live value under `<key>.backup.<epoch-ms>`.
    pub fn create_backup(&self) -> Result<String, StorageError> {
        self.create_backup_at(timestamp::now())
    }

    pub(crate) fn create_backup_at(&self, now: DateTime<Utc>) -> Result<String, StorageError> {
        let raw = self
            .store
            .get(&self.key)?
            .unwrap_or_else(|| "[]".to_string());
        let existing = self.store.keys()?;
        let mut millis = now.timestamp_millis();
        let mut backup_key = self.backup_key(millis);
        while existing.contains(&backup_key) {
            millis += 1;
            backup_key = self.backup_key(millis);
        }
        self.store.set(&backup_key, &raw)?;
        info!(
            "created backup (key={}, bytes={})",
            backup_key,
            raw.len()
        );
        Ok(backup_key)
    }

    /// Raw contents of a backup; `None` when it does not exist.
    pub fn read_backup(&self, backup_key: &str) -> Result<Option<String>, StorageError> {
        if parse_backup_millis(&self.key, backup_key).is_none() {
            return Ok(None);
        }
        self.store.get(backup_key)
    }

    /// Overwrite the live value with a raw snapshot.
    pub fn write_raw(&self, raw: &str) -> Result<(), StorageError> {
        self.store.set(&self.key, raw)
    }

    /// Backups of this record set, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, StorageError> {
        let mut backups: Vec<(i64, String)> = self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| parse_backup_millis(&self.key, &key).map(|millis| (millis, key)))
            .collect();
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(backups
            .into_iter()
            .filter_map(|(millis, key)| {
                timestamp::from_epoch_millis(millis).map(|created_at| BackupInfo { key, created_at })
            })
            .collect())
    }

    /// Remove all but the `retain` newest backups; 0 keeps everything.
    ///
    /// Returns the number of backups removed.
    pub fn prune_backups(&self, retain: usize) -> Result<usize, StorageError> {
        if retain == 0 {
            return Ok(0);
        }
        let backups = self.list_backups()?;
        let mut removed = 0;
        for backup in backups.iter().skip(retain) {
            self.store.remove(&backup.key)?;
            removed += 1;
        }
        if removed > 0 {
            debug!("pruned backups (key={}, removed={removed})", self.key);
        }
        Ok(removed)
    }

    fn backup_key(&self, millis: i64) -> String {
        format!("{}.backup.{millis}", self.key)
    }
}

/// Epoch milliseconds of a backup key belonging to `live_key`.
fn parse_backup_millis(live_key: &str, candidate: &str) -> Option<i64> {
    candidate
        .strip_prefix(live_key)?
        .strip_prefix(".backup.")?
        .parse()
        .ok()
}

/// Decode a stored array, dropping what cannot be read.
fn parse_records(raw: &str, key: &str) -> Vec<PromptRecord> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("stored prompts are not valid JSON, treating as empty (key={key}): {err}");
            return Vec::new();
        }
    };
    let Value::Array(entries) = value else {
        warn!("stored prompts are not an array, treating as empty (key={key})");
        return Vec::new();
    };
    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<PromptRecord>(entry) {
            Ok(record) => records.push(record),
            Err(err) => warn!("invalid stored prompt ignored (key={key}, index={index}): {err}"),
        }
    }
    records
}
