//! Persistent store abstractions used by the bridge.
//!
//! `KeyStore` is an append-only log of colon-delimited numeric records,
//! one per line, addressed by 0-based line index. `ScratchStore` holds a
//! single string that the guest overwrites wholesale.
//!
//! Implementations:
//! - `FileKeyStore` / `FileScratchStore`: plain text files
//! - `MemKeyStore` / `MemScratchStore`: in-memory, for tests
//!
//! Neither backend locks across processes. Run a single writer process
//! per store file; within one process appends are serialised.

use crate::error::HostError;
use crate::types::RECORD_SEPARATOR;

/// Append-only record log.
pub trait KeyStore: Send + Sync {
    /// Get the record text at `index`.
    ///
    /// Returns `Ok(None)` if the index is past the end or the store does
    /// not exist yet.
    fn read_record(&self, index: usize) -> Result<Option<String>, HostError>;

    /// Append one record and return the total record count afterwards.
    ///
    /// Existing records keep their indices.
    fn append_record(&self, values: &[i32]) -> Result<usize, HostError>;

    /// Number of records currently in the store.
    fn record_count(&self) -> Result<usize, HostError>;
}

/// Single-value string store.
pub trait ScratchStore: Send + Sync {
    /// Read the stored string. A store that was never written reads as empty.
    fn read(&self) -> Result<String, HostError>;

    /// Replace the stored string.
    fn write(&self, contents: &str) -> Result<(), HostError>;
}

/// Serialise values as one record line, without the trailing newline.
pub fn format_record(values: &[i32]) -> String {
    let mut line = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(RECORD_SEPARATOR);
        }
        line.push_str(&value.to_string());
    }
    line
}

/// The record at `index` within a store's full text.
pub fn record_at(contents: &str, index: usize) -> Option<&str> {
    contents.lines().nth(index)
}

/// Number of records within a store's full text.
pub fn count_records(contents: &str) -> usize {
    contents.lines().count()
}

/// Parse the field at `index` of a record.
pub fn parse_field(record: &str, index: usize) -> Result<i32, HostError> {
    let field = record
        .split(RECORD_SEPARATOR)
        .nth(index)
        .ok_or_else(|| HostError::MalformedRecord {
            index,
            reason: "no such field".into(),
        })?;
    field
        .trim()
        .parse::<i32>()
        .map_err(|e| HostError::MalformedRecord {
            index,
            reason: e.to_string(),
        })
}

/// Field `index` of a record, or `0` when it is absent or not numeric.
pub fn extract_field(record: &str, index: usize) -> i32 {
    parse_field(record, index).unwrap_or(0)
}
