//! Shared test helpers for integration tests.
//!
//! Provides in-memory stores, a captured stdout, and sandbox factory
//! functions for the WAT guests used across the integration test files.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use hostlink_hostapi::{MemKeyStore, MemScratchStore};
use hostlink_sandbox::{ExecutionReport, HostState, Sandbox, SandboxConfig, SandboxError};

/// `print_char` sink that can be inspected after the run.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Everything a guest can observably touch.
pub struct Harness {
    pub keys: Arc<MemKeyStore>,
    pub scratch: Arc<MemScratchStore>,
    pub stdout: CapturedOutput,
    pub config: SandboxConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SandboxConfig::default())
    }

    pub fn with_config(config: SandboxConfig) -> Self {
        Self {
            keys: Arc::new(MemKeyStore::new()),
            scratch: Arc::new(MemScratchStore::new()),
            stdout: CapturedOutput::default(),
            config,
        }
    }

    pub fn with_records(records: &[&str]) -> Self {
        Self {
            keys: Arc::new(MemKeyStore::with_records(records.iter().copied())),
            ..Self::new()
        }
    }

    /// Fresh host state wired to this harness.
    pub fn host_state(&self, args: &[&str]) -> HostState {
        HostState::new(
            &self.config,
            args.iter().map(|s| s.to_string()).collect(),
            self.keys.clone(),
            self.scratch.clone(),
        )
        .with_stdout(self.stdout.clone())
    }

    /// Compile, validate, and run a WAT guest.
    pub fn run(&self, wat: &str, args: &[&str]) -> Result<ExecutionReport, SandboxError> {
        let sandbox = load_sandbox_with_config(wat, self.config.clone());
        sandbox.run_with(self.host_state(args))
    }
}

/// Load a sandbox with default config from WAT text.
pub fn load_sandbox(wat: &str) -> Sandbox {
    load_sandbox_with_config(wat, SandboxConfig::default())
}

/// Load a sandbox with custom config from WAT text.
pub fn load_sandbox_with_config(wat: &str, config: SandboxConfig) -> Sandbox {
    Sandbox::new(wat.as_bytes(), config).expect("failed to load test module")
}

/// WAT imports for the streaming string reader.
pub const PRINT_STR_IMPORTS: &str = r#"
    (import "spectest" "print_char" (func $print (param i32)))
    (import "__moonbit_fs_unstable" "begin_read_string" (func $begin (param i32) (result i32)))
    (import "__moonbit_fs_unstable" "string_read_char" (func $read_char (param i32) (result i32)))
    (import "__moonbit_fs_unstable" "finish_read_string" (func $finish (param i32)))
"#;

/// Prints a string reference one code point at a time.
pub const PRINT_STR_FUNC: &str = r#"
    (func $print_str (param $s i32)
        (local $h i32)
        (local $c i32)
        (local.set $h (call $begin (local.get $s)))
        (block $done
            (loop $next
                (local.set $c (call $read_char (local.get $h)))
                (br_if $done (i32.eq (local.get $c) (i32.const -1)))
                (call $print (local.get $c))
                (br $next)))
        (call $finish (local.get $h)))
"#;

/// Assemble a guest module: the `$print_str` helper plus extra imports
/// and definitions. Imports must precede every function definition.
pub fn guest(imports: &str, body: &str) -> String {
    format!("(module {PRINT_STR_IMPORTS} {imports} {PRINT_STR_FUNC} {body})")
}
