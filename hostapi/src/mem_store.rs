//! In-memory stores for testing.
//!
//! `MemKeyStore` and `MemScratchStore` implement the store traits without
//! touching the filesystem. Useful for unit and integration tests where
//! on-disk persistence is not under test.

use std::sync::{Mutex, PoisonError};

use crate::error::HostError;
use crate::store::{format_record, KeyStore, ScratchStore};

/// In-memory key store: one formatted line per record.
#[derive(Debug, Default)]
pub struct MemKeyStore {
    records: Mutex<Vec<String>>,
}

impl MemKeyStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with record lines.
    pub fn with_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: Mutex::new(records.into_iter().map(Into::into).collect()),
        }
    }

    /// Snapshot of every record line.
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KeyStore for MemKeyStore {
    fn read_record(&self, index: usize) -> Result<Option<String>, HostError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(index).cloned())
    }

    fn append_record(&self, values: &[i32]) -> Result<usize, HostError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(format_record(values));
        Ok(records.len())
    }

    fn record_count(&self) -> Result<usize, HostError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len())
    }
}

/// In-memory scratch store.
#[derive(Debug, Default)]
pub struct MemScratchStore {
    contents: Mutex<String>,
}

impl MemScratchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(contents.into()),
        }
    }
}

impl ScratchStore for MemScratchStore {
    fn read(&self) -> Result<String, HostError> {
        Ok(self
            .contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, contents: &str) -> Result<(), HostError> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = contents.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = MemKeyStore::new();
        assert_eq!(store.record_count().unwrap(), 0);
        assert_eq!(store.read_record(0).unwrap(), None);
    }

    #[test]
    fn test_append_returns_new_count() {
        let store = MemKeyStore::new();
        assert_eq!(store.append_record(&[65, 66, 67]).unwrap(), 1);
        assert_eq!(store.append_record(&[1]).unwrap(), 2);
        assert_eq!(store.read_record(0).unwrap().as_deref(), Some("65:66:67"));
        assert_eq!(store.read_record(1).unwrap().as_deref(), Some("1"));
        assert_eq!(store.read_record(2).unwrap(), None);
    }

    #[test]
    fn test_with_records() {
        let store = MemKeyStore::with_records(["1:2", "3:4"]);
        assert_eq!(store.record_count().unwrap(), 2);
        assert_eq!(store.read_record(1).unwrap().as_deref(), Some("3:4"));
        assert_eq!(store.records(), vec!["1:2".to_string(), "3:4".to_string()]);
    }

    #[test]
    fn test_scratch_store_overwrites() {
        let store = MemScratchStore::with_contents("old");
        assert_eq!(store.read().unwrap(), "old");
        store.write("new").unwrap();
        assert_eq!(store.read().unwrap(), "new");
    }
}
