//! Host function registration via Wasmtime linker.
//!
//! Registers every import listed in [`crate::abi::HOST_IMPORTS`]. Each
//! function pulls `HostState` out of the `Caller` and forwards to the
//! matching [`HostApi`] method. Only `panic` and `abort` return an error,
//! which unwinds the guest call.

use wasmtime::{Caller, Linker, Memory};

use hostlink_hostapi::types::NULL_REF;
use hostlink_hostapi::HostApi;

use crate::abi::{ALLOC, CUSTOM, DEALLOC, ENV, FS, GC, RUNTIME, SPECTEST, TIME};
use crate::error::SandboxError;
use crate::host_impl::HostState;
use crate::memory;

/// Get the guest's exported memory from a Caller.
fn get_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    caller.get_export("memory").and_then(|e| e.into_memory())
}

/// Register all host functions with the linker.
pub fn register_host_functions(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    register_diagnostics(linker)?;
    register_args(linker)?;
    register_value_arrays(linker)?;
    register_stores(linker)?;
    register_strings(linker)?;
    register_streaming(linker)?;
    register_environment(linker)?;
    register_runtime(linker)?;
    register_allocator(linker)?;
    Ok(())
}

// ── Diagnostics ──

fn register_diagnostics(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        SPECTEST,
        "print_char",
        |mut caller: Caller<'_, HostState>, code: i32| caller.data_mut().print_char(code),
    )?;
    Ok(())
}

// ── Arguments ──

fn register_args(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(ENV, "args", |mut caller: Caller<'_, HostState>| -> i32 {
        caller.data_mut().args()
    })?;
    linker.func_wrap(FS, "args_get", |mut caller: Caller<'_, HostState>| -> i32 {
        caller.data_mut().args_get()
    })?;
    Ok(())
}

// ── Value arrays ──

fn register_value_arrays(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        CUSTOM,
        "make_js_array",
        |mut caller: Caller<'_, HostState>| -> i32 { caller.data_mut().make_array() },
    )?;
    linker.func_wrap(
        CUSTOM,
        "push_js_array",
        |mut caller: Caller<'_, HostState>, array: i32, value: i32| -> i32 {
            caller.data_mut().push_array(array, value)
        },
    )?;
    linker.func_wrap(
        CUSTOM,
        "make_js_byte_array",
        |mut caller: Caller<'_, HostState>| -> i32 { caller.data_mut().make_byte_array() },
    )?;
    linker.func_wrap(
        CUSTOM,
        "push_to_js_byte_array",
        |mut caller: Caller<'_, HostState>, array: i32, byte: i32| -> i32 {
            caller.data_mut().push_byte_array(array, byte)
        },
    )?;
    Ok(())
}

// ── Key store and scratch store ──

fn register_stores(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        CUSTOM,
        "read_cipher_from_file",
        |mut caller: Caller<'_, HostState>, line_index: i32| -> i32 {
            caller.data_mut().read_record(line_index)
        },
    )?;
    linker.func_wrap(
        CUSTOM,
        "get_byte_from_js_string",
        |caller: Caller<'_, HostState>, record: i32, field_index: i32| -> i32 {
            caller.data().record_field(record, field_index)
        },
    )?;
    linker.func_wrap(
        CUSTOM,
        "append_to_key_store",
        |mut caller: Caller<'_, HostState>, array: i32| -> i32 {
            caller.data_mut().append_record(array)
        },
    )?;
    linker.func_wrap(
        CUSTOM,
        "read_string_from_file",
        |mut caller: Caller<'_, HostState>| -> i32 { caller.data_mut().read_scratch() },
    )?;
    linker.func_wrap(
        CUSTOM,
        "write_to_string_store",
        |mut caller: Caller<'_, HostState>, s: i32| caller.data_mut().write_scratch(s),
    )?;
    linker.func_wrap(
        CUSTOM,
        "write_byte_array_to_string_store",
        |mut caller: Caller<'_, HostState>, array: i32| {
            caller.data_mut().write_scratch_bytes(array)
        },
    )?;
    Ok(())
}

// ── Strings ──

fn register_strings(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        CUSTOM,
        "js_string_length",
        |caller: Caller<'_, HostState>, s: i32| -> i32 { caller.data().string_length(s) },
    )?;
    linker.func_wrap(
        CUSTOM,
        "js_string_char_at",
        |caller: Caller<'_, HostState>, s: i32, index: i32| -> i32 {
            caller.data().string_char_at(s, index)
        },
    )?;
    linker.func_wrap(
        CUSTOM,
        "string_from_utf8",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> i32 {
            let mem = match get_memory(&mut caller) {
                Some(m) => m,
                None => {
                    tracing::warn!("string_from_utf8: module exports no memory");
                    return NULL_REF;
                }
            };

            let bytes = match memory::read_bytes(mem.data(&caller), ptr, len) {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(ptr, len, error = %e, "string_from_utf8: bad range");
                    return NULL_REF;
                }
            };

            caller.data_mut().string_from_utf8(&bytes)
        },
    )?;
    linker.func_wrap(
        CUSTOM,
        "release_ref",
        |mut caller: Caller<'_, HostState>, reference: i32| {
            caller.data_mut().release_ref(reference)
        },
    )?;
    Ok(())
}

// ── Streaming reads ──

fn register_streaming(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        FS,
        "begin_read_string",
        |mut caller: Caller<'_, HostState>, s: i32| -> i32 {
            caller.data_mut().begin_read_string(s)
        },
    )?;
    linker.func_wrap(
        FS,
        "string_read_char",
        |mut caller: Caller<'_, HostState>, handle: i32| -> i32 {
            caller.data_mut().string_read_char(handle)
        },
    )?;
    linker.func_wrap(
        FS,
        "finish_read_string",
        |mut caller: Caller<'_, HostState>, handle: i32| {
            caller.data_mut().finish_read_string(handle)
        },
    )?;
    linker.func_wrap(
        FS,
        "begin_read_string_array",
        |mut caller: Caller<'_, HostState>, array: i32| -> i32 {
            caller.data_mut().begin_read_string_array(array)
        },
    )?;
    linker.func_wrap(
        FS,
        "string_array_read_string",
        |mut caller: Caller<'_, HostState>, handle: i32| -> i32 {
            caller.data_mut().string_array_read_string(handle)
        },
    )?;
    linker.func_wrap(
        FS,
        "finish_read_string_array",
        |mut caller: Caller<'_, HostState>, handle: i32| {
            caller.data_mut().finish_read_string_array(handle)
        },
    )?;
    Ok(())
}

// ── Environment ──

fn register_environment(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(FS, "current_dir", |mut caller: Caller<'_, HostState>| -> i32 {
        caller.data_mut().current_dir()
    })?;
    linker.func_wrap(TIME, "now", |caller: Caller<'_, HostState>| -> i64 {
        caller.data().now()
    })?;
    Ok(())
}

// ── Runtime ──

fn register_runtime(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        RUNTIME,
        "panic",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<()> {
            Err(caller.data_mut().panic().into())
        },
    )?;
    linker.func_wrap(
        RUNTIME,
        "abort",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<()> {
            Err(caller.data_mut().abort().into())
        },
    )?;
    linker.func_wrap(RUNTIME, "trace", |caller: Caller<'_, HostState>| {
        caller.data().trace()
    })?;
    linker.func_wrap(
        RUNTIME,
        "trace_num",
        |caller: Caller<'_, HostState>, value: i64| caller.data().trace_num(value),
    )?;
    linker.func_wrap(
        RUNTIME,
        "trace_str",
        |caller: Caller<'_, HostState>, s: i32| caller.data().trace_value(s),
    )?;
    linker.func_wrap(
        RUNTIME,
        "trace_any",
        |caller: Caller<'_, HostState>, value: i32| caller.data().trace_value(value),
    )?;
    Ok(())
}

// ── Allocator ──

fn register_allocator(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        ALLOC,
        "malloc",
        |mut caller: Caller<'_, HostState>, size: i32| -> i32 { caller.data_mut().malloc(size) },
    )?;
    linker.func_wrap(
        ALLOC,
        "realloc",
        |mut caller: Caller<'_, HostState>, address: i32, size: i32| -> i32 {
            caller.data_mut().realloc(address, size)
        },
    )?;
    linker.func_wrap(
        DEALLOC,
        "free",
        |mut caller: Caller<'_, HostState>, address: i32| caller.data_mut().free(address),
    )?;
    linker.func_wrap(GC, "gc", |mut caller: Caller<'_, HostState>| {
        caller.data_mut().gc()
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hostlink_hostapi::{MemKeyStore, MemScratchStore};
    use wasmtime::{Engine, Store};

    use super::*;
    use crate::abi::HOST_IMPORTS;
    use crate::config::SandboxConfig;

    #[test]
    fn test_every_listed_import_is_registered() {
        let engine = Engine::default();
        let mut linker = Linker::new(&engine);
        register_host_functions(&mut linker).unwrap();

        let state = HostState::new(
            &SandboxConfig::default(),
            Vec::new(),
            Arc::new(MemKeyStore::new()),
            Arc::new(MemScratchStore::new()),
        );
        let mut store = Store::new(&engine, state);
        for import in HOST_IMPORTS {
            assert!(
                linker.get(&mut store, import.module, import.name).is_some(),
                "{}::{} not registered",
                import.module,
                import.name
            );
        }
    }
}
