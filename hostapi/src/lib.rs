//! `hostlink-hostapi`: runtime-independent pieces of the Hostlink bridge.
//!
//! A sandboxed module can only pass numbers across its boundary. This
//! crate provides the host-side state that lets it work with strings,
//! arrays and persistent records anyway:
//!
//! - `HandleTable`: opaque handles for pending reads, never reused
//! - `StringCursor` / `StringArrayCursor`: forward-only streaming reads
//! - `RefTable`: session-owned strings and arrays held by reference
//! - `KeyStore` / `ScratchStore`: file-backed and in-memory stores
//! - `LinearAllocator`: host region behind `malloc`/`realloc`/`free`
//! - `HostApi`: the import surface, implemented by the sandbox
//! - `HostError` / `GuestTrap`: error and trap types
//!
//! Nothing here depends on a WASM engine; the sandbox crate wires it up.

pub mod error;
pub mod types;
pub mod handle_table;
pub mod cursor;
pub mod refs;
pub mod store;
pub mod file_store;
pub mod mem_store;
pub mod allocator;
pub mod traits;

// Re-export commonly used types at the crate root.
pub use error::{GuestTrap, HostError, ResourceKind};
pub use handle_table::HandleTable;
pub use cursor::{PendingRead, StringArrayCursor, StringCursor};
pub use refs::{BoundaryValue, RefTable};
pub use store::{extract_field, KeyStore, ScratchStore};
pub use file_store::{FileKeyStore, FileScratchStore};
pub use mem_store::{MemKeyStore, MemScratchStore};
pub use allocator::LinearAllocator;
pub use traits::HostApi;
