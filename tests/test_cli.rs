//! CLI Integration Tests for locus
//!
//! These tests execute the binary and verify:
//! - answers on stdout for saved and unsaved sources
//! - relative includes inside unsaved buffers
//! - exit codes for empty answers and bad arguments
//! - config file handling

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn locus() -> Command {
    Command::cargo_bin("locus").unwrap()
}

// ============================================================================
// Answers
// ============================================================================

#[test]
fn test_current_function_at() {
    locus()
        .args(["current_function_at", "tests/data/current-function.cpp:-std=c++1y:13:1"])
        .assert()
        .success()
        .stdout("{'name':'ns::C::foo'}\n");
}

#[test]
fn test_kebab_case_query_name() {
    locus()
        .args(["current-function-at", "tests/data/current-function.cpp:-std=c++1y:29:1"])
        .assert()
        .success()
        .stdout("{'name':'D::D'}\n");
}

#[test]
fn test_unsaved_current_function_at() {
    locus()
        .current_dir("tests/data/unsaved")
        .args([
            "current_function_at",
            "current-function.cpp#../current-function.cpp:-std=c++1y:13:1",
        ])
        .assert()
        .success()
        .stdout("{'name':'ns::C::foo'}\n");
}

#[test]
fn test_unsaved_comment_at() {
    locus()
        .current_dir("tests/data/unsaved")
        .args([
            "comment_at",
            "current-function.cpp#../current-function.cpp:-std=c++1y:49:5",
        ])
        .assert()
        .success()
        .stdout("{'brief':'This is foo.'}\n");
}

#[test]
fn test_unsaved_declaration_at() {
    locus()
        .current_dir("tests/data/unsaved")
        .args([
            "deduced_declaration_at",
            "declaration.cpp#declaration-unsaved.cpp:-std=c++1y:5:4",
        ])
        .assert()
        .success()
        .stdout("{'file':'./declaration.hpp','line':'1','col':'5',}\n");
}

#[test]
fn test_unsaved_include_at() {
    locus()
        .current_dir("tests/data/unsaved")
        .args(["include_at", "include.cpp#include-unsaved.cpp:-std=c++1y:1:14"])
        .assert()
        .success()
        .stdout("{'file':'./include.hpp'}\n");
}

#[test]
fn test_saved_file_ignores_unsaved_copy() {
    locus()
        .current_dir("tests/data/unsaved")
        .args(["deduced_declaration_at", "declaration.cpp:-std=c++1y:5:4"])
        .assert()
        .success()
        .stdout("{}\n");
}

// ============================================================================
// Empty Answers and Errors
// ============================================================================

#[test]
fn test_missing_file_prints_empty_record() {
    locus()
        .args(["location_info", "tests/data/nope.cpp:-std=c++1y:1:1"])
        .assert()
        .success()
        .stdout("{}\n");
}

#[test]
fn test_missing_file_prints_empty_list() {
    locus()
        .args(["all_extents", "tests/data/nope.cpp:-std=c++1y:1:1"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_unknown_query_is_a_usage_error() {
    locus()
        .args(["completion_at", "tests/data/current-function.cpp::1:1"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown query 'completion_at'"));
}

#[test]
fn test_missing_location_is_a_usage_error() {
    locus().arg("type_at").assert().failure().code(2);
}

#[test]
fn test_logs_stay_off_stdout() {
    locus()
        .args([
            "type_at",
            "tests/data/current-function.cpp:-std=c++1y:14:12",
            "--log-level",
            "trace",
            "--no-color",
        ])
        .assert()
        .success()
        .stdout("{'type':'int','type_kind':'Int','is_POD_type':1,}\n")
        .stderr(predicate::str::contains("resolved start cursor"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_adds_include_dirs() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("locus.json");
    let include = format!("{}/tests/data/include", env!("CARGO_MANIFEST_DIR"));
    std::fs::write(&config, format!(r#"{{"include_dirs": ["{}"]}}"#, include)).unwrap();

    locus()
        .args(["include_at", "tests/data/include/test.cpp::1:2", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(format!("{{'file':'{}/test.hpp'}}\n", include));
}

#[test]
fn test_bad_config_file_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.json");
    std::fs::write(&config, "{ nope").unwrap();

    locus()
        .args(["type_at", "tests/data/current-function.cpp::14:12", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading configuration"));
}
