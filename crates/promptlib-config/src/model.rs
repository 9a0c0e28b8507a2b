//! Configuration schema for the prompt library.

use directories::UserDirs;
use promptlib_protocol::{DuplicatePolicy, ImportMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory under the home directory holding config and data.
pub const DEFAULT_HOME_DIR: &str = ".promptlib";
/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "promptLibrary.v1";

/// Root config for the prompt library.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptLibConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl PromptLibConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> PromptLibConfigBuilder {
        PromptLibConfigBuilder::new()
    }
}

/// Builder for assembling a `PromptLibConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct PromptLibConfigBuilder {
    config: PromptLibConfig,
}

impl PromptLibConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: PromptLibConfig::default(),
        }
    }

    /// Replace the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Replace the import configuration.
    pub fn import(mut self, import: ImportConfig) -> Self {
        self.config.import = import;
        self
    }

    /// Replace the export configuration.
    pub fn export(mut self, export: ExportConfig) -> Self {
        self.config.export = export;
        self
    }

    /// Finalize and return the built `PromptLibConfig`.
    pub fn build(self) -> PromptLibConfig {
        self.config
    }
}

/// Where and how the record set is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory; `~/` is expanded. Defaults to `~/.promptlib/data`.
    #[serde(default)]
    pub path: Option<String>,
    /// Key of the slot holding the serialized record array.
    #[serde(default = "default_storage_key")]
    pub key: String,
    /// Optional cap on the total bytes held by the store.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_storage_key(),
            quota_bytes: None,
        }
    }
}

impl StorageConfig {
    /// Resolve the data directory, expanding `~/` against the home directory.
    pub fn data_dir(&self) -> PathBuf {
        match self.path.as_deref() {
            Some(path) => expand_home(path),
            None => default_home_dir().join("data"),
        }
    }
}

/// Default storage key.
fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// How duplicate ids are resolved during a merge import.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnDuplicate {
    /// Ask interactively once per import.
    #[default]
    Ask,
    /// Always keep the stored record.
    Keep,
    /// Always take the incoming record.
    Overwrite,
}

impl OnDuplicate {
    /// Fixed policy, or `None` when the user has to be asked.
    pub fn policy(&self) -> Option<DuplicatePolicy> {
        match self {
            OnDuplicate::Ask => None,
            OnDuplicate::Keep => Some(DuplicatePolicy::Keep),
            OnDuplicate::Overwrite => Some(DuplicatePolicy::Overwrite),
        }
    }
}

/// Import defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub mode: ImportMode,
    #[serde(default)]
    pub on_duplicate: OnDuplicate,
    /// Number of pre-import backups to keep; 0 keeps all of them.
    #[serde(default = "default_backup_retention")]
    pub backup_retention: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            mode: ImportMode::default(),
            on_duplicate: OnDuplicate::default(),
            backup_retention: default_backup_retention(),
        }
    }
}

/// Default number of retained backups.
fn default_backup_retention() -> usize {
    5
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Directory export files are written to; defaults to the cwd.
    #[serde(default)]
    pub dir: Option<String>,
}

impl ExportConfig {
    /// Resolve the export directory, falling back to `.`.
    pub fn output_dir(&self) -> PathBuf {
        self.dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// `~/.promptlib`, or `./.promptlib` when no home directory is known.
pub fn default_home_dir() -> PathBuf {
    UserDirs::new()
        .map(|dirs| dirs.home_dir().join(DEFAULT_HOME_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME_DIR))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = UserDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
