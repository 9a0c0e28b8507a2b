use super::KeyValueStore;
use crate::error::StorageError;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// In-memory key-value store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if let Some(quota) = self.quota_bytes {
            let others: u64 = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| (existing.len() + stored.len()) as u64)
                .sum();
            let required = others + (key.len() + value.len()) as u64;
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
        assert_eq!(store.keys().expect("keys"), vec!["k".to_string()]);
        store.remove("k").expect("remove");
        store.remove("k").expect("remove twice");
        assert_eq!(store.get("k").expect("get"), None);
    }

    #[test]
    fn quota_counts_other_entries_and_replacement() {
        let store = MemoryStore::with_quota(10);
        store.set("a", "12345").expect("fits");
        // replacing "a" does not double count it
        store.set("a", "123456789").expect("fits");
        let err = store.set("b", "1").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                required: 12,
                quota: 10,
                ..
            }
        ));
        assert_eq!(store.get("b").expect("get"), None);
    }
}
