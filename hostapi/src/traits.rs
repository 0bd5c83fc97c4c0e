//! Host API trait: the boundary surface a sandboxed module binds against.
//!
//! Each method corresponds to one host import. Arguments and results are
//! the primitive values that cross the boundary: `i32` handles, value
//! references, code points and counts. Failures never escape as errors;
//! each method returns the sentinel its import defines and logs the
//! cause. The typed errors stay available one layer down, on
//! `RefTable`, `KeyStore` and `LinearAllocator`.
//!
//! The only non-returning outcomes are `panic` and `abort`, which hand
//! back a [`GuestTrap`] for the caller to raise.

use crate::error::GuestTrap;

/// Host-side implementation of the bridge imports.
///
/// One instance exists per module instantiation; all handle, reference
/// and allocator state is owned by it.
pub trait HostApi {
    // ── Diagnostics ──

    /// Write one character to standard output. Invalid code points print
    /// as U+FFFD.
    fn print_char(&mut self, code: i32);

    // ── Arguments ──

    /// The forwarded argument vector as a string-array reference.
    fn args(&mut self) -> i32;

    /// Register the forwarded argument vector as a pending string-array
    /// read and return its handle.
    fn args_get(&mut self) -> i32;

    // ── Value arrays ──

    /// New empty value array. Returns its reference.
    fn make_array(&mut self) -> i32;

    /// Append `value` and return the same array reference.
    fn push_array(&mut self, array: i32, value: i32) -> i32;

    /// New empty byte array. Returns its reference.
    fn make_byte_array(&mut self) -> i32;

    /// Append the low 8 bits of `byte` and return the same reference.
    fn push_byte_array(&mut self, array: i32, byte: i32) -> i32;

    // ── Key store ──

    /// Record text at `line_index` as a string reference; empty when the
    /// index is out of range or the store is missing.
    fn read_record(&mut self, line_index: i32) -> i32;

    /// Integer field `field_index` of the string `record`, or `0`.
    fn record_field(&self, record: i32, field_index: i32) -> i32;

    /// Consume a value array, append it as a record, and return the new
    /// record count. `0` on failure.
    fn append_record(&mut self, array: i32) -> i32;

    // ── Scratch store ──

    /// The scratch store contents as a string reference.
    fn read_scratch(&mut self) -> i32;

    /// Overwrite the scratch store with the string `s`.
    fn write_scratch(&mut self, s: i32);

    /// Consume a byte array and overwrite the scratch store with it, one
    /// character per byte.
    fn write_scratch_bytes(&mut self, array: i32);

    // ── Strings ──

    /// Number of code points in `s`, `0` if unknown.
    fn string_length(&self, s: i32) -> i32;

    /// Code point at `index` in `s`, `-1` if absent.
    fn string_char_at(&self, s: i32, index: i32) -> i32;

    /// New string reference from UTF-8 bytes (lossy).
    fn string_from_utf8(&mut self, bytes: &[u8]) -> i32;

    /// Drop a value reference. Idempotent.
    fn release_ref(&mut self, reference: i32);

    // ── Streaming reads ──

    /// Start streaming the string `s` and return a handle.
    fn begin_read_string(&mut self, s: i32) -> i32;

    /// Next code point of a pending string, or `-1` once exhausted or
    /// when the handle is unknown.
    fn string_read_char(&mut self, handle: i32) -> i32;

    /// Release a pending string. Idempotent.
    fn finish_read_string(&mut self, handle: i32);

    /// Start streaming the string array `array` and return a handle.
    fn begin_read_string_array(&mut self, array: i32) -> i32;

    /// Next string of a pending array as a string reference, or the
    /// end-of-array marker once exhausted or when the handle is unknown.
    ///
    /// Each element read registers a fresh reference the guest may
    /// release. Every marker read returns the same reference.
    fn string_array_read_string(&mut self, handle: i32) -> i32;

    /// Release a pending string array. Idempotent.
    fn finish_read_string_array(&mut self, handle: i32);

    // ── Environment ──

    /// Process working directory as a string reference.
    fn current_dir(&mut self) -> i32;

    /// Wall-clock milliseconds since the Unix epoch.
    fn now(&self) -> i64;

    // ── Runtime ──

    /// Report a guest panic. The caller must raise the returned trap.
    fn panic(&mut self) -> GuestTrap;

    /// Report a guest abort. The caller must raise the returned trap.
    fn abort(&mut self) -> GuestTrap;

    /// Diagnostic hook with no payload.
    fn trace(&self) {}

    /// Diagnostic hook carrying a number.
    fn trace_num(&self, _value: i64) {}

    /// Diagnostic hook carrying a value reference.
    fn trace_value(&self, _reference: i32) {}

    // ── Allocator ──

    /// Reserve `size` bytes; `0` on failure or negative size.
    fn malloc(&mut self, size: i32) -> i32;

    /// Resize a block; `0` on failure.
    fn realloc(&mut self, address: i32, size: i32) -> i32;

    /// Release a block. Unknown addresses are ignored.
    fn free(&mut self, address: i32);

    /// Compaction hook.
    fn gc(&mut self);
}
