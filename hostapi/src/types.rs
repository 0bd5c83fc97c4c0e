//! Boundary constants shared by the bridge and the import layer.
//!
//! Every value here is part of the contract with the compiled module:
//! changing one breaks modules that were built against it.

/// Terminal marker appended once to every pending string array.
///
/// A guest reads strings until it sees this value. It is a real string,
/// so a guest must compare against it rather than treat it as data.
pub const END_OF_STRING_ARRAY: &str = "ffi_end_of_/string_array";

/// Returned by `string_read_char` once a pending string is exhausted,
/// or when the handle is unknown.
pub const END_OF_STRING: i32 = -1;

/// The null value reference. Never issued by a `RefTable`.
pub const NULL_REF: i32 = 0;

/// The null allocator address. Never handed out by `malloc`.
pub const NULL_ADDRESS: u32 = 0;

/// Field separator inside one key-store record line.
pub const RECORD_SEPARATOR: char = ':';

/// Default key-store file name, relative to the working directory.
pub const DEFAULT_KEY_STORE: &str = "key_store.txt";

/// Default scratch string-store file name, relative to the working directory.
pub const DEFAULT_STRING_STORE: &str = "string_store.txt";

/// Allocator block alignment in bytes.
pub const HEAP_ALIGN: usize = 8;

/// Default initial size of the allocator region (64 KiB).
pub const DEFAULT_HEAP_INITIAL: usize = 64 * 1024;

/// Default ceiling of the allocator region (16 MiB).
pub const DEFAULT_HEAP_MAX: usize = 16 * 1024 * 1024;
