//! In-memory key-value store for tests and host tools.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::store::{KeyValueStore, Namespace};

/// Memory store error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// Writes were switched off with [`MemoryStore::fail_writes`] or
    /// [`MemoryStore::fail_write_at`]
    WriteRejected,
}

impl core::fmt::Display for MemoryStoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MemoryStoreError::WriteRejected => write!(f, "Write rejected"),
        }
    }
}

impl core::error::Error for MemoryStoreError {}

/// Key-value store kept in a `BTreeMap`
///
/// Writes can be made to fail to simulate power loss in the middle of a
/// grading step.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<(String, String), Vec<u8>>,
    fail_writes: bool,
    /// Writes left before the one that is rejected
    fail_after: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every following `set` and `remove` while `fail` is true
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Reject only the `n`th following `set` or `remove` (0-based)
    pub fn fail_write_at(&mut self, n: usize) {
        self.fail_after = Some(n);
    }

    fn reject_write(&mut self) -> bool {
        if self.fail_writes {
            return true;
        }
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                true
            }
            Some(n) => {
                self.fail_after = Some(n - 1);
                false
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw value lookup, bypassing fault injection
    pub fn peek(&self, namespace: &Namespace, key: &str) -> Option<&[u8]> {
        self.entries
            .get(&Self::entry_key(namespace, key))
            .map(Vec::as_slice)
    }

    fn entry_key(namespace: &Namespace, key: &str) -> (String, String) {
        (namespace.as_str().to_string(), key.to_string())
    }
}

impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    fn get(&mut self, namespace: &Namespace, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.entries.get(&Self::entry_key(namespace, key)).cloned())
    }

    fn set(&mut self, namespace: &Namespace, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        if self.reject_write() {
            return Err(MemoryStoreError::WriteRejected);
        }
        self.entries
            .insert(Self::entry_key(namespace, key), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, namespace: &Namespace, key: &str) -> Result<bool, Self::Error> {
        if self.reject_write() {
            return Err(MemoryStoreError::WriteRejected);
        }
        Ok(self.entries.remove(&Self::entry_key(namespace, key)).is_some())
    }
}
