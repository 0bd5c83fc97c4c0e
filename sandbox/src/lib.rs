//! `hostlink-sandbox`: Wasmtime host for modules built against the
//! Hostlink bridge.
//!
//! This crate loads, validates, and runs a compiled module inside
//! Wasmtime, wiring its imports to the bridge in `hostlink-hostapi`. It
//! enforces:
//!
//! - **Import whitelisting:** only the listed host functions, no WASI
//! - **Entry-point validation:** `_start` or `main`, no params, no results
//! - **Memory limits:** bounded linear memory growth
//! - **Optional fuel metering:** instruction limit for runaway guests
//!
//! The primary entry point is [`Sandbox::run`].

pub mod abi;
pub mod error;
pub mod config;
pub mod cli;
pub mod memory;
pub mod host_impl;
pub mod validation;
pub mod linker;
pub mod runtime;

pub use error::SandboxError;
pub use config::SandboxConfig;
pub use host_impl::HostState;
pub use runtime::{ExecutionReport, Sandbox};
