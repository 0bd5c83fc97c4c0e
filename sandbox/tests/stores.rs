//! Key-store and scratch-store tests, in memory and on disk.

mod common;

use std::fs;

use hostlink_hostapi::{KeyStore, ScratchStore};
use hostlink_sandbox::SandboxConfig;

use common::*;

const STORE_IMPORTS: &str = r#"
    (import "custom_module" "make_js_array" (func $make_arr (result i32)))
    (import "custom_module" "push_js_array" (func $push (param i32 i32) (result i32)))
    (import "custom_module" "append_to_key_store" (func $append (param i32) (result i32)))
    (import "custom_module" "read_cipher_from_file" (func $read_record (param i32) (result i32)))
    (import "custom_module" "get_byte_from_js_string" (func $field (param i32 i32) (result i32)))
    (import "custom_module" "make_js_byte_array" (func $make_bytes (result i32)))
    (import "custom_module" "push_to_js_byte_array" (func $push_byte (param i32 i32) (result i32)))
    (import "custom_module" "write_byte_array_to_string_store" (func $write_bytes (param i32)))
    (import "custom_module" "write_to_string_store" (func $write_str (param i32)))
    (import "custom_module" "read_string_from_file" (func $read_str (result i32)))
"#;

/// Appends `[65, 66, 67]`, prints the new record count as a digit.
fn append_abc() -> String {
    guest(
        STORE_IMPORTS,
        r#"
        (func (export "_start")
            (call $print
                (i32.add (i32.const 48)
                    (call $append
                        (call $push
                            (call $push
                                (call $push (call $make_arr) (i32.const 65))
                                (i32.const 66))
                            (i32.const 67))))))
        "#,
    )
}

// ── Test: append returns the record count ──

#[test]
fn test_append_returns_count() {
    let harness = Harness::new();
    harness.run(&append_abc(), &[]).unwrap();
    assert_eq!(harness.stdout.text(), "1");
    assert_eq!(harness.keys.records(), vec!["65:66:67".to_string()]);

    harness.run(&append_abc(), &[]).unwrap();
    assert_eq!(harness.stdout.text(), "12");
    assert_eq!(harness.keys.record_count().unwrap(), 2);
}

#[test]
fn test_empty_array_appends_empty_record() {
    let wat = guest(
        STORE_IMPORTS,
        r#"
        (func (export "_start")
            (drop (call $append (call $make_arr))))
        "#,
    );
    let harness = Harness::with_records(&["1:2"]);
    harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.keys.records(), vec!["1:2".to_string(), String::new()]);
}

// ── Test: reading records back by line index ──

#[test]
fn test_read_record_fields() {
    let wat = guest(
        STORE_IMPORTS,
        r#"
        (func (export "_start")
            (local $rec i32)
            (local.set $rec (call $read_record (i32.const 1)))
            (call $print_str (local.get $rec))
            (call $print (i32.const 10))
            (call $print (call $field (local.get $rec) (i32.const 0)))
            (call $print (call $field (local.get $rec) (i32.const 2)))
            ;; missing field reads 0
            (call $print (i32.add (i32.const 48) (call $field (local.get $rec) (i32.const 7))))
            ;; missing record reads as the empty string
            (call $print_str (call $read_record (i32.const 5))))
        "#,
    );
    let harness = Harness::with_records(&["1:2", "72:105:33"]);
    harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.stdout.text(), "72:105:33\nH!0");
}

// ── Test: scratch store ──

#[test]
fn test_byte_array_to_scratch_then_read_back() {
    let wat = guest(
        STORE_IMPORTS,
        r#"
        (func (export "_start")
            (call $write_bytes
                (call $push_byte
                    (call $push_byte (call $make_bytes) (i32.const 72))
                    ;; only the low 8 bits are kept: 0x169 -> 'i'
                    (i32.const 0x169)))
            (call $print_str (call $read_str)))
        "#,
    );
    let harness = Harness::new();
    harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.stdout.text(), "Hi");
}

#[test]
fn test_scratch_string_overwrite() {
    let wat = guest(
        STORE_IMPORTS,
        r#"
        (func (export "_start")
            (call $write_str (call $read_record (i32.const 0)))
            (call $print_str (call $read_str)))
        "#,
    );
    let harness = Harness::with_records(&["9:9"]);
    harness.scratch.write("stale").unwrap();
    harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.stdout.text(), "9:9");
}

// ── Test: file-backed stores persist across runs ──

#[test]
fn test_file_stores_persist_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = SandboxConfig {
        key_store_path: dir.path().join("key_store.txt"),
        string_store_path: dir.path().join("string_store.txt"),
        ..SandboxConfig::default()
    };

    let wat = guest(
        STORE_IMPORTS,
        r#"
        (func (export "_start")
            (drop (call $append
                (call $push (call $push (call $make_arr) (i32.const 7)) (i32.const -8))))
            (call $write_str (call $read_record (i32.const 0))))
        "#,
    );
    let sandbox = load_sandbox_with_config(&wat, config.clone());
    sandbox.run(Vec::new()).unwrap();
    sandbox.run(Vec::new()).unwrap();

    assert_eq!(
        fs::read_to_string(&config.key_store_path).unwrap(),
        "7:-8\n7:-8\n"
    );
    assert_eq!(
        fs::read_to_string(&config.string_store_path).unwrap(),
        "7:-8"
    );
}
