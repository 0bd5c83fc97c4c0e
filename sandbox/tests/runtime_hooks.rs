//! Allocator, clock, working directory, and trace hook tests.

mod common;

use common::*;

const HOOK_IMPORTS: &str = r#"
    (import "__moonbit_alloc" "malloc" (func $malloc (param i32) (result i32)))
    (import "__moonbit_alloc" "realloc" (func $realloc (param i32 i32) (result i32)))
    (import "__moonbit_dealloc" "free" (func $free (param i32)))
    (import "__moonbit_gc" "gc" (func $gc))
    (import "__moonbit_time_unstable" "now" (func $now (result i64)))
    (import "__moonbit_fs_unstable" "current_dir" (func $current_dir (result i32)))
    (import "__moonbit_rt" "trace" (func $trace))
    (import "__moonbit_rt" "trace_num" (func $trace_num (param i64)))
    (import "__moonbit_rt" "trace_str" (func $trace_str (param i32)))
    (import "__moonbit_rt" "trace_any" (func $trace_any (param i32)))
    (import "custom_module" "release_ref" (func $release (param i32)))
"#;

// ── Test: allocator ──

#[test]
fn test_malloc_realloc_free() {
    let wat = guest(
        HOOK_IMPORTS,
        r#"
        (func $check (param $ok i32)
            (call $print (select (i32.const 89) (i32.const 78) (local.get $ok))))
        (func (export "_start")
            (local $a i32)
            (local $b i32)
            (local $c i32)
            (local.set $a (call $malloc (i32.const 24)))
            (local.set $b (call $malloc (i32.const 8)))
            ;; non-null, 8-byte aligned, disjoint
            (call $check (i32.ne (local.get $a) (i32.const 0)))
            (call $check (i32.eqz (i32.and (local.get $a) (i32.const 7))))
            (call $check (i32.ge_u (local.get $b) (i32.add (local.get $a) (i32.const 24))))
            (local.set $c (call $realloc (local.get $a) (i32.const 256)))
            (call $check (i32.ne (local.get $c) (i32.const 0)))
            ;; negative sizes fail with the null address
            (call $check (i32.eqz (call $malloc (i32.const -4))))
            (call $free (local.get $b))
            (call $free (local.get $c))
            (call $free (local.get $c))
            (call $gc))
        "#,
    );
    let harness = Harness::new();
    let report = harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.stdout.text(), "YYYYY");
    assert_eq!(report.host.heap.live_count(), 0);
}

#[test]
fn test_live_blocks_survive_gc() {
    let wat = guest(
        HOOK_IMPORTS,
        r#"
        (func (export "_start")
            (drop (call $malloc (i32.const 100)))
            (call $gc))
        "#,
    );
    let harness = Harness::new();
    let report = harness.run(&wat, &[]).unwrap();
    let blocks: Vec<_> = report.host.heap.live_blocks().collect();
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].1 >= 100);
}

// ── Test: environment ──

#[test]
fn test_now_is_wall_clock_millis() {
    let wat = guest(
        HOOK_IMPORTS,
        r#"
        (func (export "_start")
            ;; 2020-01-01T00:00:00Z in milliseconds
            (if (i64.gt_s (call $now) (i64.const 1577836800000))
                (then (call $print (i32.const 84)))))
        "#,
    );
    let harness = Harness::new();
    harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.stdout.text(), "T");
}

#[test]
fn test_current_dir() {
    let wat = guest(
        HOOK_IMPORTS,
        r#"(func (export "_start") (call $print_str (call $current_dir)))"#,
    );
    let harness = Harness::new();
    harness.run(&wat, &[]).unwrap();
    let expected = std::env::current_dir().unwrap();
    assert_eq!(harness.stdout.text(), expected.to_string_lossy());
}

// ── Test: trace hooks and ref release have no visible effect ──

#[test]
fn test_trace_hooks_are_silent() {
    let wat = guest(
        HOOK_IMPORTS,
        r#"
        (func (export "_start")
            (local $dir i32)
            (local.set $dir (call $current_dir))
            (call $trace)
            (call $trace_num (i64.const -1))
            (call $trace_str (local.get $dir))
            (call $trace_any (i32.const 12345))
            (call $release (local.get $dir))
            (call $release (local.get $dir)))
        "#,
    );
    let harness = Harness::new();
    let report = harness.run(&wat, &[]).unwrap();
    assert_eq!(harness.stdout.text(), "");
    assert!(report.host.refs.is_empty());
}
