//! CLI compare integration tests
//!
//! These tests run the built `slotguard` binary against snapshot files and
//! check its output and exit status.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const REF: &str = r#"{
  "Token": {
    "storage": [
      { "label": "owner", "slot": "0", "offset": 0, "type": "t_address" },
      { "label": "supply", "slot": "1", "offset": 0, "type": "t_uint256" }
    ],
    "types": {
      "t_address": { "encoding": "inplace", "label": "address", "numberOfBytes": "20" },
      "t_uint256": { "encoding": "inplace", "label": "uint256", "numberOfBytes": "32" }
    }
  }
}"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn head_with(extra_storage: &str) -> String {
    format!(
        r#"{{
  "Token": {{
    "storage": [
      {{ "label": "owner", "slot": "0", "offset": 0, "type": "t_address" }}{}
    ],
    "types": {{
      "t_address": {{ "encoding": "inplace", "label": "address", "numberOfBytes": "20" }},
      "t_uint256": {{ "encoding": "inplace", "label": "uint256", "numberOfBytes": "32" }}
    }}
  }}
}}"#,
        extra_storage
    )
}

fn run(args: &[&str]) -> Output {
    let cli_bin = env!("CARGO_BIN_EXE_slotguard");
    Command::new(cli_bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI")
}

fn compare(reference: &Path, head: &Path, extra: &[&str]) -> Output {
    let mut args = vec![
        "compare",
        "--ref",
        reference.to_str().unwrap(),
        "--head",
        head.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    run(&args)
}

#[test]
fn test_cli_identical_snapshots_pass() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let head = write(&temp_dir, "head.json", REF);

    let output = compare(&reference, &head, &[]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("**Status**: Safe"));
    assert!(stdout.contains("Result: PASS"));
}

#[test]
fn test_cli_appended_variable_passes() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let head = write(
        &temp_dir,
        "head.json",
        &head_with(
            r#",
      { "label": "supply", "slot": "1", "offset": 0, "type": "t_uint256" },
      { "label": "cap", "slot": "2", "offset": 0, "type": "t_uint256" }"#,
        ),
    );

    let output = compare(&reference, &head, &[]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_cli_removed_variable_fails_with_exit_1() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let head = write(&temp_dir, "head.json", &head_with(""));

    let output = compare(&reference, &head, &[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("**UNSAFE-REMOVE** `supply`"));
    assert!(stdout.contains("Result: FAIL"));
}

#[test]
fn test_cli_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let head = write(&temp_dir, "head.json", &head_with(""));

    let output = compare(&reference, &head, &["--format", "json"]);

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["units"]["Token"]["status"], "compared");
    assert_eq!(
        json["units"]["Token"]["report"]["findings"][1]["severity"],
        "UNSAFE_REMOVE"
    );
}

#[test]
fn test_cli_strict_flag_rejects_warnings() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(
        &temp_dir,
        "ref.json",
        r#"{ "V": { "storage": [ { "label": "admin", "type": "t_uint160" } ],
                    "types": { "t_uint160": { "label": "uint160", "numberOfBytes": "20" } } } }"#,
    );
    let head = write(
        &temp_dir,
        "head.json",
        r#"{ "V": { "storage": [ { "label": "admin", "type": "t_address" } ],
                    "types": { "t_address": { "label": "address", "numberOfBytes": "20" } } } }"#,
    );

    assert_eq!(compare(&reference, &head, &[]).status.code(), Some(0));
    assert_eq!(
        compare(&reference, &head, &["--strict"]).status.code(),
        Some(1)
    );
}

#[test]
fn test_cli_config_file_policy() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let head = write(&temp_dir, "head.json", "{}");
    let config = write(&temp_dir, "slotguard.toml", "[units]\nfail_on_removed = true\n");

    // Whole-unit removal is reported but tolerated by default.
    let output = compare(&reference, &head, &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Removed (only in reference)"));

    let output = compare(&reference, &head, &["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));

    let output = compare(&reference, &head, &["--fail-on-removed-unit"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_malformed_unit_exits_2() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let head = write(
        &temp_dir,
        "head.json",
        r#"{ "Token": { "storage": [ { "label": "owner", "type": "t_unknown" } ], "types": {} } }"#,
    );

    let output = compare(&reference, &head, &[]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_MALFORMED_LAYOUT"), "Stderr: {}", stderr);
}

#[test]
fn test_cli_missing_file_exits_2() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let missing = temp_dir.path().join("missing.json");

    let output = compare(&reference, &missing, &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_IO"));
}

#[test]
fn test_cli_invalid_config_exits_2() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);
    let config = write(&temp_dir, "bad.toml", "[check\n");

    let output = compare(&reference, &reference, &["--config", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_INVALID_CONFIG"));
}

#[test]
fn test_cli_production_logs_are_json_on_stderr() {
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", REF);

    let output = compare(&reference, &reference, &["--log", "production"]);

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let first = stderr.lines().next().expect("expected log output");
    let event: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(event["fields"]["event"], "start");
}

#[test]
fn test_cli_accepts_layouts_without_encoding() {
    let layout = r#"{
  "Pool": {
    "storage": [
      { "label": "balances", "slot": "0", "offset": 0, "type": "t_mapping(t_address,t_uint256)" },
      { "label": "ticks", "slot": "1", "offset": 0, "type": "t_array(t_struct(Tick)4_storage)2_storage" },
      { "label": "price", "slot": "5", "offset": 0, "type": "t_userDefinedValueType(Price)7" }
    ],
    "types": {
      "t_address": { "label": "address", "numberOfBytes": "20" },
      "t_uint256": { "label": "uint256", "numberOfBytes": "32" },
      "t_mapping(t_address,t_uint256)": { "label": "mapping(address => uint256)", "numberOfBytes": "32" },
      "t_array(t_struct(Tick)4_storage)2_storage": { "label": "struct Pool.Tick[2]", "numberOfBytes": "128" },
      "t_struct(Tick)4_storage": {
        "label": "struct Pool.Tick",
        "numberOfBytes": "64",
        "members": [
          { "label": "liquidity", "slot": "0", "offset": 0, "type": "t_uint256" },
          { "label": "fee", "slot": "1", "offset": 0, "type": "t_uint256" }
        ]
      },
      "t_userDefinedValueType(Price)7": { "label": "Price", "numberOfBytes": "16" }
    }
  }
}"#;
    let temp_dir = TempDir::new().unwrap();
    let reference = write(&temp_dir, "ref.json", layout);
    let head = write(&temp_dir, "head.json", layout);

    let output = compare(&reference, &head, &[]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Result: PASS (1 units)"));
}
