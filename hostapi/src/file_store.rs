//! File-backed stores.
//!
//! Both stores live as plain text files, by default in the process
//! working directory. A missing file reads as empty and is created on
//! the first write.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::HostError;
use crate::store::{count_records, format_record, record_at, KeyStore, ScratchStore};

/// Read a whole store file; a missing file is an empty store.
fn read_or_empty(path: &Path) -> Result<String, HostError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(HostError::store_io(path, e)),
    }
}

/// True when the file is empty or its last byte is a newline.
fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Key store backed by a newline-delimited text file.
///
/// The full file is re-read for every lookup. Key stores are expected to
/// stay small.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileKeyStore {
    fn read_record(&self, index: usize) -> Result<Option<String>, HostError> {
        let contents = read_or_empty(&self.path)?;
        Ok(record_at(&contents, index).map(str::to_owned))
    }

    fn append_record(&self, values: &[i32]) -> Result<usize, HostError> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HostError::store_io(&self.path, e))?;

        let mut line = String::new();
        if !ends_with_newline(&mut file).map_err(|e| HostError::store_io(&self.path, e))? {
            // Close an unterminated last line so the new record starts its own.
            line.push('\n');
        }
        line.push_str(&format_record(values));
        line.push('\n');

        // One write per record.
        file.write_all(line.as_bytes())
            .map_err(|e| HostError::store_io(&self.path, e))?;

        let count = self.record_count()?;
        tracing::debug!(path = %self.path.display(), count, "appended key record");
        Ok(count)
    }

    fn record_count(&self) -> Result<usize, HostError> {
        Ok(count_records(&read_or_empty(&self.path)?))
    }
}

/// Scratch string store backed by one text file.
#[derive(Debug, Clone)]
pub struct FileScratchStore {
    path: PathBuf,
}

impl FileScratchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScratchStore for FileScratchStore {
    fn read(&self) -> Result<String, HostError> {
        read_or_empty(&self.path)
    }

    fn write(&self, contents: &str) -> Result<(), HostError> {
        fs::write(&self.path, contents).map_err(|e| HostError::store_io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), len = contents.len(), "wrote scratch store");
        Ok(())
    }
}
