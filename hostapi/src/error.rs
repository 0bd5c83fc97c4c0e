//! Host-side error types for the Hostlink bridge.
//!
//! `HostError` is the error type returned by every fallible bridge
//! operation. None of these errors cross the boundary as-is: the import
//! layer maps each one to the sentinel the guest expects (`-1`, `0`, an
//! empty string, or the end-of-array marker) and logs the cause.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which host-side table a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A pending string or string-array read, keyed by handle.
    PendingRead,
    /// A boundary value (string, array), keyed by reference.
    Value,
    /// A block handed out by the allocator, keyed by address.
    Allocation,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingRead => f.write_str("pending read"),
            Self::Value => f.write_str("value reference"),
            Self::Allocation => f.write_str("allocation"),
        }
    }
}

/// Host-side error type returned by bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Lookup against an unknown or released handle/reference.
    #[error("{kind} {id} not found")]
    ResourceNotFound { kind: ResourceKind, id: i64 },

    /// The resource exists but holds a different variant than requested.
    #[error("{kind} {id} has the wrong type: expected {expected}")]
    WrongType {
        kind: ResourceKind,
        id: i64,
        expected: &'static str,
    },

    /// Key-store or scratch-store read/write failure.
    #[error("store I/O error on {}: {source}", .path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key-store field that is missing or not a decimal integer.
    #[error("malformed record field {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// The handle or reference counter ran past `i32::MAX`.
    #[error("{0} id space exhausted")]
    IdSpaceExhausted(ResourceKind),

    /// The allocator could not satisfy a request within its ceiling.
    #[error("allocation of {size} bytes failed: heap ceiling reached")]
    AllocationFailed { size: usize },

    /// A guest pointer/length pair falls outside linear memory.
    #[error("guest pointer out of bounds")]
    BadPointer,
}

/// A fatal signal raised by the guest through `panic` or `abort`.
///
/// Host functions return this as an error so the guest call unwinds; only
/// the top-level driver turns it into a process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuestTrap {
    #[error("guest panicked")]
    Panic,
    #[error("guest aborted")]
    Abort,
}

impl HostError {
    /// Create a not-found error for a pending-read handle.
    pub fn unknown_handle(handle: i32) -> Self {
        Self::ResourceNotFound {
            kind: ResourceKind::PendingRead,
            id: handle.into(),
        }
    }

    /// Create a not-found error for a value reference.
    pub fn unknown_ref(reference: i32) -> Self {
        Self::ResourceNotFound {
            kind: ResourceKind::Value,
            id: reference.into(),
        }
    }

    /// Create a not-found error for an allocator address.
    pub fn unknown_address(address: u32) -> Self {
        Self::ResourceNotFound {
            kind: ResourceKind::Allocation,
            id: address.into(),
        }
    }

    /// Wrap an I/O error with the store path it happened on.
    pub fn store_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StoreIo {
            path: path.into(),
            source,
        }
    }

    /// Returns true for the `ResourceNotFound` kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }
}
