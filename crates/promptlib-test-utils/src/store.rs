use parking_lot::Mutex;
use promptlib_core::{KeyValueStore, MemoryStore, StorageError};
use std::io;

/// In-memory store that fails writes to one key on demand.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing_key: Mutex<Option<String>>,
    remaining_failures: Mutex<usize>,
    corrupt_on_failure: bool,
    writes: Mutex<Vec<String>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failed writes first leave a truncated value behind, like a torn write.
    pub fn corrupting() -> Self {
        Self {
            corrupt_on_failure: true,
            ..Self::default()
        }
    }

    /// Fail the next `times` writes to `key`.
    pub fn fail_writes(&self, key: &str, times: usize) {
        *self.failing_key.lock() = Some(key.to_string());
        *self.remaining_failures.lock() = times;
    }

    /// Keys written successfully, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    fn should_fail(&self, key: &str) -> bool {
        let failing = self.failing_key.lock();
        if failing.as_deref() != Some(key) {
            return false;
        }
        let mut remaining = self.remaining_failures.lock();
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        true
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.should_fail(key) {
            if self.corrupt_on_failure {
                let torn: String = value.chars().take(value.chars().count() / 2).collect();
                self.inner.set(key, &torn)?;
            }
            return Err(StorageError::Io(io::Error::other(format!(
                "injected write failure (key={key})"
            ))));
        }
        self.inner.set(key, value)?;
        self.writes.lock().push(key.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }
}
