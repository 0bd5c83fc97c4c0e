//! Sandbox error types.

use std::path::PathBuf;

use hostlink_hostapi::GuestTrap;

/// Top-level error type for the sandbox crate.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Wasmtime engine, compilation, or linker error.
    #[error("wasmtime error: {0}")]
    Wasmtime(#[from] anyhow::Error),

    /// The module file could not be read.
    #[error("failed to read module {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Module validation failed (missing entry point, bad imports, etc.).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The module could not be linked or instantiated.
    #[error("instantiation failed: {0:#}")]
    Instantiation(anyhow::Error),

    /// Fuel exhausted during execution.
    #[error("fuel exhausted (instruction limit)")]
    FuelExhausted,

    /// WASM guest trapped (unreachable, out-of-bounds access, ...).
    #[error("guest trapped: {0}")]
    GuestTrapped(String),

    /// The guest called `panic` or `abort`.
    #[error("{0}")]
    Trap(#[from] GuestTrap),
}

impl SandboxError {
    /// True for errors raised before any guest code ran.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::ValidationError(_) | Self::Instantiation(_)
        )
    }
}
