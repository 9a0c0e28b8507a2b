use super::KeyValueStore;
use crate::error::StorageError;
use log::{debug, info};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Extension of value files inside the data directory.
const VALUE_EXTENSION: &str = "json";

/// File-backed key-value store: one `<key>.json` file per key.
#[derive(Debug)]
pub struct FileStore {
    /// Root directory holding one file per key.
    root: PathBuf,
    quota_bytes: Option<u64>,
    /// Serialize writers within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store under `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file store (root={})", root.display());
        Ok(Self {
            root,
            quota_bytes: None,
            write_lock: Mutex::new(()),
        })
    }

    /// Limit the total bytes of keys and values held by the store.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{VALUE_EXTENSION}.tmp"))
    }

    /// Bytes held by every key other than `exclude`.
    fn usage_excluding(&self, exclude: &str) -> Result<u64, StorageError> {
        let mut total = 0;
        for key in self.keys()? {
            if key == exclude {
                continue;
            }
            let size = match fs::metadata(self.value_path(&key)?) {
                Ok(metadata) => metadata.len(),
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            total += key.len() as u64 + size;
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.value_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write atomically through a temp file and rename.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        let _guard = self.write_lock.lock();
        if let Some(quota) = self.quota_bytes {
            let required = self.usage_excluding(key)? + (key.len() + value.len()) as u64;
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }
        let temp_path = self.temp_path(key);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &path)?;
        debug!("wrote key (key={key}, bytes={})", value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(&format!(".{VALUE_EXTENSION}")) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Keys become file names, so they must not escape the root.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('.')
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StorageError::Unavailable(format!("invalid storage key: {key:?}")));
    }
    Ok(())
}
