//! Per-instantiation mutable state held in the Wasmtime Store.
//!
//! `HostState` owns the pending-read handle table, the value reference
//! table, the host allocator and the stores for one module run. It
//! implements [`HostApi`], mapping every lower-layer error onto the
//! sentinel the matching import defines.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hostlink_hostapi::types::{END_OF_STRING, END_OF_STRING_ARRAY, NULL_ADDRESS, NULL_REF};
use hostlink_hostapi::{
    extract_field, BoundaryValue, FileKeyStore, FileScratchStore, GuestTrap, HandleTable,
    HostApi, HostError, KeyStore, LinearAllocator, PendingRead, RefTable, ResourceKind,
    ScratchStore, StringArrayCursor, StringCursor,
};
use wasmtime::{StoreLimits, StoreLimitsBuilder};

use crate::config::SandboxConfig;

/// Per-instantiation mutable state held in the Wasmtime `Store`.
///
/// Created fresh for each `Sandbox::run` call and returned to the caller
/// in the execution report once the entry point has finished.
pub struct HostState {
    /// Pending streaming reads, addressed by handle.
    pub reads: HandleTable<PendingRead>,
    /// Strings and arrays the guest holds by reference.
    pub refs: RefTable,
    /// Region behind `malloc`/`realloc`/`free`.
    pub heap: LinearAllocator,
    /// Arguments forwarded to the module.
    pub args: Vec<String>,
    /// Persistent record log.
    pub key_store: Arc<dyn KeyStore>,
    /// Single-string scratch store.
    pub scratch: Arc<dyn ScratchStore>,
    /// Guest memory limits enforced by the store.
    pub limits: StoreLimits,
    stdout: Box<dyn Write + Send>,
    end_marker: i32,
}

impl HostState {
    /// Create host state over explicit stores. Output goes to the process
    /// standard output until replaced with [`HostState::with_stdout`].
    pub fn new(
        config: &SandboxConfig,
        args: Vec<String>,
        key_store: Arc<dyn KeyStore>,
        scratch: Arc<dyn ScratchStore>,
    ) -> Self {
        Self {
            reads: HandleTable::new(ResourceKind::PendingRead),
            refs: RefTable::new(),
            heap: LinearAllocator::new(config.heap_initial_bytes, config.heap_max_bytes),
            args,
            key_store,
            scratch,
            limits: StoreLimitsBuilder::new()
                .memory_size(config.max_memory_bytes())
                .instances(1)
                .build(),
            stdout: Box::new(std::io::stdout()),
            end_marker: NULL_REF,
        }
    }

    /// Create host state over the file stores named in `config`.
    pub fn from_config(config: &SandboxConfig, args: Vec<String>) -> Self {
        Self::new(
            config,
            args,
            Arc::new(FileKeyStore::new(&config.key_store_path)),
            Arc::new(FileScratchStore::new(&config.string_store_path)),
        )
    }

    /// Redirect `print_char` output.
    pub fn with_stdout(mut self, stdout: impl Write + Send + 'static) -> Self {
        self.stdout = Box::new(stdout);
        self
    }

    /// Register a new value, or log and hand back the null reference.
    fn new_ref(&mut self, value: BoundaryValue) -> i32 {
        match self.refs.insert(value) {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!(error = %e, "could not register value");
                NULL_REF
            }
        }
    }

    fn new_read(&mut self, read: PendingRead) -> i32 {
        match self.reads.allocate(read) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "could not register pending read");
                END_OF_STRING
            }
        }
    }

    /// The end-of-array marker ref, shared by every exhausted read. Only
    /// re-registered after the guest releases it.
    fn end_marker_ref(&mut self) -> i32 {
        if !matches!(self.refs.str(self.end_marker), Ok(s) if s == END_OF_STRING_ARRAY) {
            self.end_marker = self.new_ref(BoundaryValue::Str(END_OF_STRING_ARRAY.to_owned()));
        }
        self.end_marker
    }

    fn str_or_empty(&self, op: &'static str, reference: i32) -> &str {
        match self.refs.str(reference) {
            Ok(s) => s,
            Err(e) => {
                recovered(op, &e);
                ""
            }
        }
    }
}

/// Log an error absorbed at the boundary. Unknown ids are a guest bug
/// rather than a host fault, so they stay at debug level.
fn recovered(op: &'static str, err: &HostError) {
    if err.is_not_found() {
        tracing::debug!(op, error = %err, "recovered with sentinel");
    } else {
        tracing::warn!(op, error = %err, "recovered with sentinel");
    }
}

fn count_to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

impl fmt::Debug for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostState")
            .field("reads", &self.reads.len())
            .field("refs", &self.refs.len())
            .field("heap_live", &self.heap.live_count())
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl HostApi for HostState {
    fn print_char(&mut self, code: i32) {
        let ch = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        let mut buf = [0u8; 4];
        let result = self
            .stdout
            .write_all(ch.encode_utf8(&mut buf).as_bytes())
            .and_then(|()| self.stdout.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "print_char failed");
        }
    }

    fn args(&mut self) -> i32 {
        let args = self.args.clone();
        self.new_ref(BoundaryValue::StrArray(args))
    }

    fn args_get(&mut self) -> i32 {
        let cursor = StringArrayCursor::new(self.args.clone());
        self.new_read(PendingRead::StringArray(cursor))
    }

    fn make_array(&mut self) -> i32 {
        self.new_ref(BoundaryValue::Values(Vec::new()))
    }

    fn push_array(&mut self, array: i32, value: i32) -> i32 {
        if let Err(e) = self.refs.push_value(array, value) {
            recovered("push_array", &e);
        }
        array
    }

    fn make_byte_array(&mut self) -> i32 {
        self.new_ref(BoundaryValue::Bytes(Vec::new()))
    }

    fn push_byte_array(&mut self, array: i32, byte: i32) -> i32 {
        // Only the low 8 bits cross.
        if let Err(e) = self.refs.push_byte(array, byte as u8) {
            recovered("push_byte_array", &e);
        }
        array
    }

    fn read_record(&mut self, line_index: i32) -> i32 {
        let record = match usize::try_from(line_index) {
            Ok(index) => match self.key_store.read_record(index) {
                Ok(record) => record.unwrap_or_default(),
                Err(e) => {
                    recovered("read_record", &e);
                    String::new()
                }
            },
            Err(_) => String::new(),
        };
        self.new_ref(BoundaryValue::Str(record))
    }

    fn record_field(&self, record: i32, field_index: i32) -> i32 {
        match usize::try_from(field_index) {
            Ok(index) => extract_field(self.str_or_empty("record_field", record), index),
            Err(_) => 0,
        }
    }

    fn append_record(&mut self, array: i32) -> i32 {
        let values = match self.refs.take_values(array) {
            Ok(values) => values,
            Err(e) => {
                recovered("append_record", &e);
                return 0;
            }
        };
        match self.key_store.append_record(&values) {
            Ok(count) => count_to_i32(count),
            Err(e) => {
                recovered("append_record", &e);
                0
            }
        }
    }

    fn read_scratch(&mut self) -> i32 {
        let contents = self.scratch.read().unwrap_or_else(|e| {
            recovered("read_scratch", &e);
            String::new()
        });
        self.new_ref(BoundaryValue::Str(contents))
    }

    fn write_scratch(&mut self, s: i32) {
        let contents = self.str_or_empty("write_scratch", s);
        if let Err(e) = self.scratch.write(contents) {
            recovered("write_scratch", &e);
        }
    }

    fn write_scratch_bytes(&mut self, array: i32) {
        let bytes = match self.refs.take_bytes(array) {
            Ok(bytes) => bytes,
            Err(e) => {
                recovered("write_scratch_bytes", &e);
                return;
            }
        };
        let contents: String = bytes.into_iter().map(char::from).collect();
        if let Err(e) = self.scratch.write(&contents) {
            recovered("write_scratch_bytes", &e);
        }
    }

    fn string_length(&self, s: i32) -> i32 {
        count_to_i32(self.str_or_empty("string_length", s).chars().count())
    }

    fn string_char_at(&self, s: i32, index: i32) -> i32 {
        let Ok(index) = usize::try_from(index) else {
            return END_OF_STRING;
        };
        self.str_or_empty("string_char_at", s)
            .chars()
            .nth(index)
            .map_or(END_OF_STRING, |ch| u32::from(ch) as i32)
    }

    fn string_from_utf8(&mut self, bytes: &[u8]) -> i32 {
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.new_ref(BoundaryValue::Str(text))
    }

    fn release_ref(&mut self, reference: i32) {
        self.refs.release(reference);
    }

    fn begin_read_string(&mut self, s: i32) -> i32 {
        let text = self.str_or_empty("begin_read_string", s).to_owned();
        self.new_read(PendingRead::String(StringCursor::new(text)))
    }

    fn string_read_char(&mut self, handle: i32) -> i32 {
        self.reads
            .get_mut(handle)
            .and_then(PendingRead::as_string_mut)
            .and_then(StringCursor::next_code_point)
            .map_or(END_OF_STRING, |ch| u32::from(ch) as i32)
    }

    fn finish_read_string(&mut self, handle: i32) {
        if matches!(self.reads.get(handle), Some(PendingRead::String(_))) {
            self.reads.release(handle);
        }
    }

    fn begin_read_string_array(&mut self, array: i32) -> i32 {
        let items = match self.refs.str_array(array) {
            Ok(items) => items.to_vec(),
            Err(e) => {
                recovered("begin_read_string_array", &e);
                Vec::new()
            }
        };
        self.new_read(PendingRead::StringArray(StringArrayCursor::new(items)))
    }

    fn string_array_read_string(&mut self, handle: i32) -> i32 {
        let next = match self
            .reads
            .get_mut(handle)
            .and_then(PendingRead::as_string_array_mut)
        {
            Some(cursor) if !cursor.is_exhausted() => cursor.next_string().to_owned(),
            _ => return self.end_marker_ref(),
        };
        self.new_ref(BoundaryValue::Str(next))
    }

    fn finish_read_string_array(&mut self, handle: i32) {
        if matches!(self.reads.get(handle), Some(PendingRead::StringArray(_))) {
            self.reads.release(handle);
        }
    }

    fn current_dir(&mut self) -> i32 {
        let dir = match std::env::current_dir() {
            Ok(dir) => dir.to_string_lossy().into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, "current_dir unavailable");
                String::new()
            }
        };
        self.new_ref(BoundaryValue::Str(dir))
    }

    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            })
    }

    fn panic(&mut self) -> GuestTrap {
        tracing::error!("guest called panic");
        GuestTrap::Panic
    }

    fn abort(&mut self) -> GuestTrap {
        tracing::error!("guest called abort");
        GuestTrap::Abort
    }

    fn trace(&self) {
        tracing::trace!(target: "guest", "trace");
    }

    fn trace_num(&self, value: i64) {
        tracing::trace!(target: "guest", value, "trace");
    }

    fn trace_value(&self, reference: i32) {
        tracing::trace!(target: "guest", reference, value = ?self.refs.get(reference), "trace");
    }

    fn malloc(&mut self, size: i32) -> i32 {
        let Ok(size) = usize::try_from(size) else {
            return NULL_ADDRESS as i32;
        };
        match self.heap.malloc(size) {
            Ok(address) => address as i32,
            Err(e) => {
                recovered("malloc", &e);
                NULL_ADDRESS as i32
            }
        }
    }

    fn realloc(&mut self, address: i32, size: i32) -> i32 {
        let (Ok(address), Ok(size)) = (u32::try_from(address), usize::try_from(size)) else {
            return NULL_ADDRESS as i32;
        };
        match self.heap.realloc(address, size) {
            Ok(address) => address as i32,
            Err(e) => {
                recovered("realloc", &e);
                NULL_ADDRESS as i32
            }
        }
    }

    fn free(&mut self, address: i32) {
        let Ok(address) = u32::try_from(address) else {
            return;
        };
        if let Err(e) = self.heap.free(address) {
            recovered("free", &e);
        }
    }

    fn gc(&mut self) {
        let reclaimed = self.heap.gc();
        tracing::debug!(reclaimed, region = self.heap.region_size(), "gc");
    }
}
