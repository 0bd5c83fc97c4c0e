//! WASM module validation: import and entry-point checks.
//!
//! Validates that a compiled module can run against the host before any
//! instance is created. Checks:
//!
//! 1. No WASI imports
//! 2. Every import is a function listed in [`crate::abi::HOST_IMPORTS`]
//! 3. Import signatures match the host definitions
//! 4. A `_start` or `main` export exists taking and returning nothing

use wasmtime::{ExternType, FuncType, Module, ValType};

use crate::abi::{find_import, is_host_module, AbiType, HostImport, ENTRY_POINTS};
use crate::error::SandboxError;

fn matches_abi(actual: impl ExactSizeIterator<Item = ValType>, expected: &[AbiType]) -> bool {
    actual.len() == expected.len()
        && actual.zip(expected).all(|(vt, abi)| match abi {
            AbiType::I32 => matches!(vt, ValType::I32),
            AbiType::I64 => matches!(vt, ValType::I64),
        })
}

/// Validate a module and return the name of the entry point to call.
pub fn validate_module(module: &Module) -> Result<&'static str, SandboxError> {
    validate_imports(module)?;
    resolve_entry_point(module)
}

/// Check that every import is a host function with the right signature.
fn validate_imports(module: &Module) -> Result<(), SandboxError> {
    for import in module.imports() {
        let module_name = import.module();
        let name = import.name();

        // Reject WASI imports
        if module_name.starts_with("wasi") {
            return Err(SandboxError::ValidationError(format!(
                "WASI import not allowed: {}::{}",
                module_name, name
            )));
        }

        if !is_host_module(module_name) {
            return Err(SandboxError::ValidationError(format!(
                "import from unknown module '{}': {}",
                module_name, name
            )));
        }

        let func_ty = match import.ty() {
            ExternType::Func(ft) => ft,
            _ => {
                return Err(SandboxError::ValidationError(format!(
                    "non-function import not allowed: {}::{}",
                    module_name, name
                )));
            }
        };

        let host = find_import(module_name, name).ok_or_else(|| {
            SandboxError::ValidationError(format!(
                "unknown host function: {}::{}",
                module_name, name
            ))
        })?;
        check_signature(host, &func_ty)?;
    }

    Ok(())
}

fn check_signature(host: &HostImport, func_ty: &FuncType) -> Result<(), SandboxError> {
    if matches_abi(func_ty.params(), host.params) && matches_abi(func_ty.results(), host.results)
    {
        return Ok(());
    }
    Err(SandboxError::ValidationError(format!(
        "import {}::{} has wrong signature: expected {:?} -> {:?}",
        host.module, host.name, host.params, host.results
    )))
}

/// Pick the first entry point the module exports.
fn resolve_entry_point(module: &Module) -> Result<&'static str, SandboxError> {
    for &name in ENTRY_POINTS {
        let Some(export) = module.get_export(name) else {
            continue;
        };
        let func_ty = match export {
            ExternType::Func(ft) => ft,
            _ => {
                return Err(SandboxError::ValidationError(format!(
                    "export '{}' must be a function",
                    name
                )));
            }
        };
        if func_ty.params().len() != 0 || func_ty.results().len() != 0 {
            return Err(SandboxError::ValidationError(format!(
                "entry point '{}' must take and return nothing",
                name
            )));
        }
        return Ok(name);
    }

    Err(SandboxError::ValidationError(
        "no _start or main function found".into(),
    ))
}
