//! Sandbox runtime: Wasmtime engine, module loading, and execution.
//!
//! The `Sandbox` struct is the main entry point. It loads a WASM module,
//! validates its imports and entry point, and provides `run` for
//! executing it against a fresh `HostState`.

use std::path::Path;

use wasmtime::{Config, Engine, Linker, Module, Store, Trap};

use hostlink_hostapi::GuestTrap;

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::host_impl::HostState;
use crate::linker::register_host_functions;
use crate::validation::validate_module;

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct ExecutionReport {
    /// The export that was called.
    pub entry_point: &'static str,
    /// Host state after the entry point returned.
    pub host: HostState,
}

/// The WASM execution sandbox.
///
/// Loads and validates a module once, then runs it by creating a fresh
/// Wasmtime instance for each call.
pub struct Sandbox {
    engine: Engine,
    module: Module,
    config: SandboxConfig,
    entry_point: &'static str,
}

impl Sandbox {
    /// Create a new sandbox from WASM bytecode or text.
    ///
    /// Validates the module's imports and entry point before accepting.
    pub fn new(wasm_bytes: &[u8], config: SandboxConfig) -> Result<Self, SandboxError> {
        let engine = create_engine(&config)?;
        let module = Module::new(&engine, wasm_bytes)?;
        Self::from_module(engine, module, config)
    }

    /// Load from a `.wasm` file path.
    pub fn from_file(path: &Path, config: SandboxConfig) -> Result<Self, SandboxError> {
        let wasm_bytes = std::fs::read(path).map_err(|source| SandboxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), len = wasm_bytes.len(), "loaded module");
        Self::new(&wasm_bytes, config)
    }

    fn from_module(
        engine: Engine,
        module: Module,
        config: SandboxConfig,
    ) -> Result<Self, SandboxError> {
        let entry_point = validate_module(&module)?;
        Ok(Self {
            engine,
            module,
            config,
            entry_point,
        })
    }

    /// The export `run` calls.
    pub fn entry_point(&self) -> &'static str {
        self.entry_point
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run the module with file-backed stores and real standard output.
    pub fn run(&self, args: Vec<String>) -> Result<ExecutionReport, SandboxError> {
        self.run_with(HostState::from_config(&self.config, args))
    }

    /// Run the module against caller-supplied host state.
    ///
    /// Creates a fresh instance, calls the entry point, and returns the
    /// host state once it finishes. The instance is discarded.
    pub fn run_with(&self, host: HostState) -> Result<ExecutionReport, SandboxError> {
        let mut store = Store::new(&self.engine, host);
        store.limiter(|state| &mut state.limits);
        if let Some(fuel) = self.config.fuel_limit {
            store.set_fuel(fuel)?;
        }

        let mut linker = Linker::new(&self.engine);
        register_host_functions(&mut linker)?;

        let instance = linker
            .instantiate(&mut store, &self.module)
            .map_err(|e| classify(e, SandboxError::Instantiation))?;

        let entry = instance.get_typed_func::<(), ()>(&mut store, self.entry_point)?;
        tracing::info!(entry_point = self.entry_point, "calling entry point");
        entry
            .call(&mut store, ())
            .map_err(|e| classify(e, |e| SandboxError::GuestTrapped(format!("{e:#}"))))?;

        Ok(ExecutionReport {
            entry_point: self.entry_point,
            host: store.into_data(),
        })
    }
}

/// Create a Wasmtime engine for the configured limits.
fn create_engine(config: &SandboxConfig) -> Result<Engine, SandboxError> {
    let mut wasm_config = Config::new();

    // Fuel metering only when a limit is set
    wasm_config.consume_fuel(config.fuel_limit.is_some());

    wasm_config.wasm_threads(false);
    wasm_config.wasm_multi_memory(false);

    let max_bytes = (config.max_memory_pages as u64) * 65536;
    wasm_config.memory_guaranteed_dense_image_size(max_bytes.min(16 * 1024 * 1024));

    Ok(Engine::new(&wasm_config)?)
}

/// Convert an error raised while guest code ran into a `SandboxError`.
///
/// `panic`/`abort` → `SandboxError::Trap`
/// Fuel exhaustion → `SandboxError::FuelExhausted`
/// Anything else → `fallback`
fn classify(e: anyhow::Error, fallback: impl FnOnce(anyhow::Error) -> SandboxError) -> SandboxError {
    if let Some(trap) = e.downcast_ref::<GuestTrap>() {
        return SandboxError::Trap(*trap);
    }
    if matches!(e.downcast_ref::<Trap>(), Some(Trap::OutOfFuel)) {
        return SandboxError::FuelExhausted;
    }
    fallback(e)
}
