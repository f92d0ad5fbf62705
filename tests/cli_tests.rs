// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI integration tests.
//!
//! These tests run the actual pds4table binary against tables written
//! through the library and verify its behavior.

mod common;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use common::{create_character_table, write_label_for};
use tempfile::TempDir;

/// Run pds4table with arguments
fn run(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_pds4table");
    Command::new(bin)
        .args(args)
        .output()
        .unwrap_or_else(|_| panic!("Failed to run {bin:?}"))
}

/// Run pds4table and assert success
fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "Command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run pds4table and assert failure
fn run_err(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        !output.status.success(),
        "Command should have failed but succeeded: {:?}",
        args
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Character table fixture with its label.
fn fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let table = create_character_table(&dir.path().join("rows.dat"));
    let label = write_label_for(&table, "rows.xml");
    drop(table);
    (dir, label)
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    let output = run_ok(&["--help"]);
    assert!(output.contains("PDS4"));
    assert!(output.contains("inspect"));
    assert!(output.contains("dump"));
    assert!(output.contains("record"));
}

#[test]
fn test_cli_version() {
    let output = run_ok(&["--version"]);
    assert!(output.contains("pds4table"));
}

#[test]
fn test_cli_invalid_subcommand() {
    let stderr = run_err(&["nonexistent"]);
    assert!(stderr.contains("unrecognized") || stderr.contains("unknown"));
}

// ============================================================================
// Inspect Tests
// ============================================================================

#[test]
fn test_inspect_tables() {
    let (_dir, label) = fixture();
    let output = run_ok(&["inspect", "tables", &arg(&label)]);

    assert!(output.contains("Tables: 1"));
    assert!(output.contains("Table: rows"));
    assert!(output.contains("Kind: Table_Character"));
    assert!(output.contains("Records: 3"));
    assert!(output.contains("Record size: 21"));
}

#[test]
fn test_inspect_fields() {
    let (_dir, label) = fixture();
    let output = run_ok(&["inspect", "fields", &arg(&label)]);

    assert!(output.contains("[0] n"));
    assert!(output.contains("[1] s | String | ASCII_String"));
}

#[test]
fn test_inspect_definition() {
    let (_dir, label) = fixture();
    let output = run_ok(&["inspect", "definition", &arg(&label)]);

    assert!(output.contains("<Record_Character>"));
    assert!(output.contains("<name>s</name>"));
}

#[test]
fn test_inspect_nonexistent_label() {
    let stderr = run_err(&["inspect", "tables", "/nonexistent/label.xml"]);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_inspect_unknown_table() {
    let (_dir, label) = fixture();
    let stderr = run_err(&["inspect", "fields", &arg(&label), "--table", "missing"]);
    assert!(stderr.contains("missing"));
}

// ============================================================================
// Dump Tests
// ============================================================================

#[test]
fn test_dump_json_lines() {
    let (_dir, label) = fixture();
    let output = run_ok(&["dump", &arg(&label)]);
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 3);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["fid"], 1);
    assert_eq!(first["properties"]["n"], 1);
    assert_eq!(first["properties"]["s"], "alpha");
    assert!(first["geometry"].is_null());
}

#[test]
fn test_dump_limit_and_filter() {
    let (_dir, label) = fixture();
    assert_eq!(run_ok(&["dump", &arg(&label), "-n", "2"]).lines().count(), 2);
    assert_eq!(
        run_ok(&["dump", &arg(&label), "--where", "s=beta", "--count"]).trim(),
        "1"
    );
    assert_eq!(
        run_ok(&["dump", &arg(&label), "--where", "n=333", "--count"]).trim(),
        "1"
    );
}

#[test]
fn test_dump_bad_filter() {
    let (_dir, label) = fixture();
    let stderr = run_err(&["dump", &arg(&label), "--where", "nope"]);
    assert!(stderr.contains("FIELD=VALUE"));
    let stderr = run_err(&["dump", &arg(&label), "--where", "x=1"]);
    assert!(stderr.contains("no field named 'x'"));
}

// ============================================================================
// Record Tests
// ============================================================================

#[test]
fn test_record_hex_dump() {
    let (_dir, label) = fixture();
    let output = run_ok(&["record", &arg(&label), "2"]);

    assert!(output.contains("=== Record 2 (21 bytes) ==="));
    assert!(output.contains("3232"));
    assert!(output.contains("beta"));
}

#[test]
fn test_record_count_is_clamped() {
    let (_dir, label) = fixture();
    let output = run_ok(&["record", &arg(&label), "3", "-c", "5"]);
    assert_eq!(output.matches("=== Record").count(), 1);
}
