//! The import surface a module may bind against.
//!
//! Every host function the linker registers is listed here with its
//! signature, so validation can reject a module before instantiation.

/// Diagnostic output.
pub const SPECTEST: &str = "spectest";
/// Argument vector.
pub const ENV: &str = "env";
/// Strings, value arrays and the two stores.
pub const CUSTOM: &str = "custom_module";
/// Streaming reads and the working directory.
pub const FS: &str = "__moonbit_fs_unstable";
/// Wall clock.
pub const TIME: &str = "__moonbit_time_unstable";
/// Panic, abort and trace hooks.
pub const RUNTIME: &str = "__moonbit_rt";
pub const ALLOC: &str = "__moonbit_alloc";
pub const DEALLOC: &str = "__moonbit_dealloc";
pub const GC: &str = "__moonbit_gc";

/// Entry points, in order of preference. Both take and return nothing.
pub const ENTRY_POINTS: &[&str] = &["_start", "main"];

/// Value type at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    I32,
    I64,
}

/// One host import: where it lives and what it looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostImport {
    pub module: &'static str,
    pub name: &'static str,
    pub params: &'static [AbiType],
    pub results: &'static [AbiType],
}

use AbiType::{I32, I64};

const fn import(
    module: &'static str,
    name: &'static str,
    params: &'static [AbiType],
    results: &'static [AbiType],
) -> HostImport {
    HostImport {
        module,
        name,
        params,
        results,
    }
}

/// Every import the linker provides.
pub const HOST_IMPORTS: &[HostImport] = &[
    import(SPECTEST, "print_char", &[I32], &[]),
    import(ENV, "args", &[], &[I32]),
    import(CUSTOM, "make_js_array", &[], &[I32]),
    import(CUSTOM, "push_js_array", &[I32, I32], &[I32]),
    import(CUSTOM, "read_cipher_from_file", &[I32], &[I32]),
    import(CUSTOM, "get_byte_from_js_string", &[I32, I32], &[I32]),
    import(CUSTOM, "append_to_key_store", &[I32], &[I32]),
    import(CUSTOM, "read_string_from_file", &[], &[I32]),
    import(CUSTOM, "write_to_string_store", &[I32], &[]),
    import(CUSTOM, "js_string_length", &[I32], &[I32]),
    import(CUSTOM, "js_string_char_at", &[I32, I32], &[I32]),
    import(CUSTOM, "make_js_byte_array", &[], &[I32]),
    import(CUSTOM, "push_to_js_byte_array", &[I32, I32], &[I32]),
    import(CUSTOM, "write_byte_array_to_string_store", &[I32], &[]),
    import(CUSTOM, "string_from_utf8", &[I32, I32], &[I32]),
    import(CUSTOM, "release_ref", &[I32], &[]),
    import(FS, "begin_read_string", &[I32], &[I32]),
    import(FS, "string_read_char", &[I32], &[I32]),
    import(FS, "finish_read_string", &[I32], &[]),
    import(FS, "begin_read_string_array", &[I32], &[I32]),
    import(FS, "string_array_read_string", &[I32], &[I32]),
    import(FS, "finish_read_string_array", &[I32], &[]),
    import(FS, "args_get", &[], &[I32]),
    import(FS, "current_dir", &[], &[I32]),
    import(TIME, "now", &[], &[I64]),
    import(RUNTIME, "panic", &[], &[]),
    import(RUNTIME, "abort", &[], &[]),
    import(RUNTIME, "trace", &[], &[]),
    import(RUNTIME, "trace_num", &[I64], &[]),
    import(RUNTIME, "trace_str", &[I32], &[]),
    import(RUNTIME, "trace_any", &[I32], &[]),
    import(ALLOC, "malloc", &[I32], &[I32]),
    import(ALLOC, "realloc", &[I32, I32], &[I32]),
    import(DEALLOC, "free", &[I32], &[]),
    import(GC, "gc", &[], &[]),
];

/// Look up a host import by module and field name.
pub fn find_import(module: &str, name: &str) -> Option<&'static HostImport> {
    HOST_IMPORTS
        .iter()
        .find(|import| import.module == module && import.name == name)
}

/// True when `module` names one of the host import modules.
pub fn is_host_module(module: &str) -> bool {
    HOST_IMPORTS.iter().any(|import| import.module == module)
}
