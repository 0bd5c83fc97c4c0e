//! Sandbox configuration.

use std::path::PathBuf;

use hostlink_hostapi::types::{
    DEFAULT_HEAP_INITIAL, DEFAULT_HEAP_MAX, DEFAULT_KEY_STORE, DEFAULT_STRING_STORE,
};

/// Module path used when none is given on the command line.
pub const DEFAULT_MODULE_PATH: &str = "target/wasm-gc/release/build/main/main.wasm";

/// Configuration for one sandbox.
///
/// Controls guest memory limits, optional instruction fuel, store file
/// locations and the host allocator region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Maximum guest linear memory pages (1 page = 64 KiB).
    /// Default: 256 pages = 16 MiB.
    pub max_memory_pages: u32,

    /// Wasmtime fuel limit. `None` disables instruction metering.
    pub fuel_limit: Option<u64>,

    /// Key-store file. Default: `key_store.txt` in the working directory.
    pub key_store_path: PathBuf,

    /// Scratch string-store file. Default: `string_store.txt`.
    pub string_store_path: PathBuf,

    /// Initial size of the host allocator region in bytes.
    pub heap_initial_bytes: usize,

    /// Ceiling of the host allocator region in bytes.
    pub heap_max_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: 256, // 16 MiB
            fuel_limit: None,
            key_store_path: PathBuf::from(DEFAULT_KEY_STORE),
            string_store_path: PathBuf::from(DEFAULT_STRING_STORE),
            heap_initial_bytes: DEFAULT_HEAP_INITIAL,
            heap_max_bytes: DEFAULT_HEAP_MAX,
        }
    }
}

impl SandboxConfig {
    /// Maximum guest linear memory in bytes.
    pub fn max_memory_bytes(&self) -> usize {
        (self.max_memory_pages as usize) * 65536
    }
}
