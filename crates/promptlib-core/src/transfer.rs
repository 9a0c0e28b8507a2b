//! Export and import of the whole record set.
//!
//! Imports are all-or-nothing: every incoming record is validated before the
//! store is touched, the live set is snapshotted under a backup key, and a
//! failed final write restores that snapshot.

use crate::error::{LibraryError, StorageError, ValidationError};
use crate::library::{PromptLibrary, synthesize_metadata};
use crate::storage::BackupInfo;
use crate::validate::{decode_record, validate_record};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use promptlib_protocol::{
    DuplicatePolicy, EXPORT_VERSION, ExportPayload, ExportStats, ImportMode, PromptRecord,
    UNKNOWN_MODEL, timestamp,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Decides, once per import, what happens to records whose id already exists.
pub trait DuplicateResolver {
    /// Called only when `duplicate_ids` is non-empty.
    fn resolve(&self, duplicate_ids: &[String]) -> DuplicatePolicy;
}

/// Resolver that always answers the same policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedResolver(pub DuplicatePolicy);

impl DuplicateResolver for FixedResolver {
    fn resolve(&self, _duplicate_ids: &[String]) -> DuplicatePolicy {
        self.0
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub mode: ImportMode,
    /// Records in the import file.
    pub received: usize,
    /// Incoming records with ids not stored before.
    pub added: usize,
    /// Stored records replaced by incoming ones.
    pub overwritten: usize,
    /// Incoming duplicates ignored in favor of the stored record.
    pub kept: usize,
    /// Records stored after the import.
    pub total: usize,
    /// Key of the pre-import snapshot.
    pub backup_key: String,
}

impl PromptLibrary {
    /// Build the export document for the current record set.
    ///
    /// Legacy records get synthesized metadata in the payload only; storage
    /// is not written.
    pub fn export_all(&self) -> Result<ExportPayload, LibraryError> {
        let records = self.store().load()?;
        let mut prompts = Vec::with_capacity(records.len());
        for (index, mut record) in records.into_iter().enumerate() {
            if record.metadata.is_none() {
                record.metadata = Some(synthesize_metadata(&record.content)?);
            }
            validate_record(&record)
                .map_err(|source| LibraryError::InvalidRecord { index, source })?;
            prompts.push(record);
        }
        let stats = compute_stats(&prompts);
        info!(
            "exported prompts (total={}, most_used_model={})",
            stats.total_prompts, stats.most_used_model
        );
        Ok(ExportPayload {
            version: EXPORT_VERSION,
            export_timestamp: timestamp::now(),
            stats,
            prompts,
        })
    }

    /// Write the export document into `dir`, returning the file path.
    pub fn export_to_file(&self, dir: impl AsRef<Path>) -> Result<PathBuf, LibraryError> {
        let payload = self.export_all()?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(export_file_name(payload.export_timestamp));
        let json = serde_json::to_string_pretty(&payload).map_err(StorageError::from)?;
        fs::write(&path, json)?;
        info!("wrote export file (path={})", path.display());
        Ok(path)
    }

    /// Import an export document.
    pub fn import_all(
        &self,
        raw_json: &str,
        mode: ImportMode,
        resolver: &dyn DuplicateResolver,
    ) -> Result<ImportReport, LibraryError> {
        let incoming = parse_payload(raw_json)?;
        let received = incoming.len();
        debug!("import payload validated (mode={mode}, received={received})");

        let existing = self.store().load()?;
        let backup_key = self.store().create_backup()?;

        let outcome = match mode {
            ImportMode::Replace => MergeOutcome {
                added: received,
                overwritten: 0,
                kept: 0,
                records: incoming,
            },
            ImportMode::Merge => {
                let existing_ids: HashSet<&str> =
                    existing.iter().map(|record| record.id.as_str()).collect();
                let duplicate_ids: Vec<String> = incoming
                    .iter()
                    .filter(|record| existing_ids.contains(record.id.as_str()))
                    .map(|record| record.id.clone())
                    .collect();
                let policy = if duplicate_ids.is_empty() {
                    DuplicatePolicy::Keep
                } else {
                    let policy = resolver.resolve(&duplicate_ids);
                    info!(
                        "resolved duplicate ids (count={}, policy={policy})",
                        duplicate_ids.len()
                    );
                    policy
                };
                merge_records(existing, incoming, policy)
            }
        };

        let total = outcome.records.len();
        if let Err(original) = self.store().save(&outcome.records) {
            warn!("import save failed, restoring backup (backup_key={backup_key}): {original}");
            return Err(self.roll_back(&backup_key, original));
        }

        if let Err(err) = self.store().prune_backups(self.backup_retention()) {
            warn!("failed to prune backups: {err}");
        }
        info!(
            "import completed (mode={mode}, received={received}, added={}, overwritten={}, kept={}, total={total})",
            outcome.added, outcome.overwritten, outcome.kept
        );
        Ok(ImportReport {
            mode,
            received,
            added: outcome.added,
            overwritten: outcome.overwritten,
            kept: outcome.kept,
            total,
            backup_key,
        })
    }

    /// Import snapshots, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, LibraryError> {
        Ok(self.store().list_backups()?)
    }

    /// Replace the live set with a snapshot, returning its record count.
    pub fn restore_backup(&self, backup_key: &str) -> Result<usize, LibraryError> {
        let raw = self
            .store()
            .read_backup(backup_key)?
            .ok_or_else(|| LibraryError::BackupNotFound(backup_key.to_string()))?;
        let value: Value = serde_json::from_str(&raw).map_err(LibraryError::Parse)?;
        let Value::Array(entries) = value else {
            return Err(LibraryError::InvalidPayload(
                "backup is not an array of prompts".to_string(),
            ));
        };
        for (index, entry) in entries.iter().enumerate() {
            serde_json::from_value::<PromptRecord>(entry.clone()).map_err(|err| {
                LibraryError::InvalidRecord {
                    index,
                    source: ValidationError::Malformed(err.to_string()),
                }
            })?;
        }
        self.store().write_raw(&raw)?;
        info!(
            "restored backup (backup_key={backup_key}, count={})",
            entries.len()
        );
        Ok(entries.len())
    }

    fn roll_back(&self, backup_key: &str, original: StorageError) -> LibraryError {
        let restored = self
            .store()
            .read_backup(backup_key)
            .and_then(|raw| self.store().write_raw(raw.as_deref().unwrap_or("[]")));
        match restored {
            Ok(()) => {
                info!("rolled back import (backup_key={backup_key})");
                LibraryError::Storage(original)
            }
            Err(restore) => LibraryError::Rollback {
                backup_key: backup_key.to_string(),
                original,
                restore,
            },
        }
    }
}

/// Summary figures for a record set.
pub fn compute_stats(records: &[PromptRecord]) -> ExportStats {
    let total_prompts = records.len();
    let average = if total_prompts == 0 {
        0.0
    } else {
        let sum: u64 = records.iter().map(|record| u64::from(record.rating)).sum();
        sum as f64 / total_prompts as f64
    };

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let model = record.model();
        let count = counts.entry(model).or_insert(0);
        if *count == 0 {
            order.push(model);
        }
        *count += 1;
    }
    let mut most_used_model = UNKNOWN_MODEL;
    let mut best = 0;
    for model in order {
        let count = counts.get(model).copied().unwrap_or(0);
        if count > best {
            best = count;
            most_used_model = model;
        }
    }

    ExportStats {
        total_prompts,
        average_rating: (average * 100.0).round() / 100.0,
        most_used_model: most_used_model.to_string(),
    }
}

/// `prompt-library-export-YYYYMMDDTHHMMSS.json` for the given export time.
pub fn export_file_name(exported_at: DateTime<Utc>) -> String {
    format!(
        "prompt-library-export-{}.json",
        exported_at.format("%Y%m%dT%H%M%S")
    )
}

struct MergeOutcome {
    records: Vec<PromptRecord>,
    added: usize,
    overwritten: usize,
    kept: usize,
}

/// Union by id: stored records keep their position, new ones are appended
/// in incoming order.
fn merge_records(
    existing: Vec<PromptRecord>,
    incoming: Vec<PromptRecord>,
    policy: DuplicatePolicy,
) -> MergeOutcome {
    let mut records = existing;
    let positions: HashMap<String, usize> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (record.id.clone(), index))
        .collect();
    let (mut added, mut overwritten, mut kept) = (0, 0, 0);
    for record in incoming {
        match positions.get(&record.id) {
            Some(&index) => match policy {
                DuplicatePolicy::Overwrite => {
                    records[index] = record;
                    overwritten += 1;
                }
                DuplicatePolicy::Keep => kept += 1,
            },
            None => {
                records.push(record);
                added += 1;
            }
        }
    }
    MergeOutcome {
        records,
        added,
        overwritten,
        kept,
    }
}

/// Parse and validate an import document, returning its records.
fn parse_payload(raw_json: &str) -> Result<Vec<PromptRecord>, LibraryError> {
    let value: Value = serde_json::from_str(raw_json).map_err(LibraryError::Parse)?;
    let Value::Object(mut document) = value else {
        return Err(LibraryError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    };

    match document.get("version") {
        Some(version) if numeric_version(version) == Some(f64::from(EXPORT_VERSION)) => {}
        Some(version) => return Err(LibraryError::UnsupportedVersion(version.to_string())),
        None => return Err(LibraryError::UnsupportedVersion("missing".to_string())),
    }

    let Some(Value::Array(entries)) = document.remove("prompts") else {
        return Err(LibraryError::InvalidPayload(
            "missing prompts array".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let record =
            decode_record(entry).map_err(|source| LibraryError::InvalidRecord { index, source })?;
        if !seen.insert(record.id.clone()) {
            return Err(LibraryError::DuplicateIncomingId(record.id));
        }
        records.push(record);
    }
    Ok(records)
}

/// Numeric value of `version`; numeric strings such as `"1"` count too.
fn numeric_version(version: &Value) -> Option<f64> {
    match version {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::create_metadata;
    use pretty_assertions::assert_eq;

    fn record(id: &str, model: &str, rating: u8) -> PromptRecord {
        PromptRecord {
            id: id.to_string(),
            title: format!("title {id}"),
            content: format!("content {id}"),
            rating,
            notes: Vec::new(),
            metadata: Some(create_metadata(model, "content", None).expect("metadata")),
        }
    }

    #[test]
    fn stats_for_empty_set() {
        assert_eq!(
            compute_stats(&[]),
            ExportStats {
                total_prompts: 0,
                average_rating: 0.0,
                most_used_model: UNKNOWN_MODEL.to_string(),
            }
        );
    }

    #[test]
    fn stats_round_average_and_break_ties_by_first_seen() {
        let records = vec![
            record("a", "claude", 5),
            record("b", "gpt-4", 4),
            record("c", "gpt-4", 0),
            record("d", "claude", 0),
            record("e", "mistral", 0),
            record("f", "mistral", 0),
        ];
        let stats = compute_stats(&records);
        assert_eq!(stats.total_prompts, 6);
        assert_eq!(stats.average_rating, 1.5);
        assert_eq!(stats.most_used_model, "claude");

        let stats = compute_stats(&[record("a", "x", 1), record("b", "y", 1), record("c", "y", 2)]);
        assert_eq!(stats.average_rating, 1.33);
        assert_eq!(stats.most_used_model, "y");
    }

    #[test]
    fn legacy_records_count_as_unknown() {
        let mut legacy = record("a", "gpt-4", 0);
        legacy.metadata = None;
        let stats = compute_stats(&[legacy.clone(), legacy, record("b", "gpt-4", 0)]);
        assert_eq!(stats.most_used_model, UNKNOWN_MODEL);
    }

    #[test]
    fn file_name_uses_compact_utc_time() {
        let ts = timestamp::parse_iso("2026-10-18T12:34:56.789Z").expect("ts");
        assert_eq!(
            export_file_name(ts),
            "prompt-library-export-20261018T123456.json"
        );
    }

    #[test]
    fn merge_preserves_positions_and_appends_new() {
        let existing = vec![record("a", "m", 1), record("b", "m", 2)];
        let incoming = vec![record("c", "m", 3), record("a", "m", 5), record("d", "m", 4)];

        let kept = merge_records(existing.clone(), incoming.clone(), DuplicatePolicy::Keep);
        let ids: Vec<&str> = kept.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(kept.records[0].rating, 1);
        assert_eq!((kept.added, kept.overwritten, kept.kept), (2, 0, 1));

        let overwritten = merge_records(existing, incoming, DuplicatePolicy::Overwrite);
        assert_eq!(overwritten.records[0].rating, 5);
        assert_eq!(overwritten.records[1].rating, 2);
        assert_eq!(
            (overwritten.added, overwritten.overwritten, overwritten.kept),
            (2, 1, 0)
        );
    }

    #[test]
    fn payload_shape_errors() {
        assert!(matches!(parse_payload("{"), Err(LibraryError::Parse(_))));
        assert!(matches!(
            parse_payload("[]"),
            Err(LibraryError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"version": 2, "prompts": []}"#),
            Err(LibraryError::UnsupportedVersion(version)) if version == "2"
        ));
        assert!(matches!(
            parse_payload(r#"{"version": "2", "prompts": []}"#),
            Err(LibraryError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"version": "one", "prompts": []}"#),
            Err(LibraryError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"version": true, "prompts": []}"#),
            Err(LibraryError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"prompts": []}"#),
            Err(LibraryError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"version": 1, "prompts": {}}"#),
            Err(LibraryError::InvalidPayload(_))
        ));
        assert_eq!(
            parse_payload(r#"{"version": 1, "prompts": []}"#).expect("empty"),
            Vec::new()
        );
    }

    #[test]
    fn numeric_string_version_is_accepted() {
        for version in [r#""1""#, r#"" 1.0 ""#, "1.0"] {
            let raw = format!(r#"{{"version": {version}, "prompts": []}}"#);
            assert_eq!(parse_payload(&raw).expect("payload"), Vec::new());
        }
    }

    #[test]
    fn payload_rejects_repeated_ids() {
        let prompts = vec![record("a", "m", 0), record("a", "m", 1)];
        let raw = serde_json::json!({ "version": 1, "prompts": prompts }).to_string();
        assert!(matches!(
            parse_payload(&raw),
            Err(LibraryError::DuplicateIncomingId(id)) if id == "a"
        ));
    }
}
