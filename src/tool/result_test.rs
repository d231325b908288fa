// ABOUTME: Tests for ToolResult - constructors, metadata and conversion from
// ABOUTME: command results.

use super::*;
use crate::subprocess::ExecResult;

fn exec(success: bool, returncode: i32, stdout: &str, stderr: &str) -> ExecResult {
    ExecResult {
        success,
        returncode,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        truncated: false,
    }
}

#[test]
fn test_text_and_error() {
    let ok = ToolResult::text("Hello, world!");
    assert_eq!(ok.content, "Hello, world!");
    assert!(!ok.is_error);

    let err = ToolResult::error("Something went wrong");
    assert!(err.is_error);
}

#[test]
fn test_with_metadata() {
    let result = ToolResult::text("output")
        .with_metadata("bytes_read", 1024)
        .with_metadata("cached", true);

    assert_eq!(result.metadata["bytes_read"], 1024);
    assert_eq!(result.metadata["cached"], true);
}

#[test]
fn test_from_successful_exec() {
    let result = ToolResult::from_exec(&exec(true, 0, "out\n", ""));
    assert_eq!(result.content, "out\n");
    assert!(!result.is_error);

    let with_stderr = ToolResult::from_exec(&exec(true, 0, "out", "warning"));
    assert_eq!(with_stderr.content, "warning\nout");
}

#[test]
fn test_from_failed_exec() {
    let result = ToolResult::from_exec(&exec(false, 2, "", "boom"));
    assert!(result.is_error);
    assert_eq!(result.content, "boom");
    assert_eq!(result.metadata["returncode"], 2);

    let silent = ToolResult::from_exec(&exec(false, 1, "", ""));
    assert_eq!(silent.content, "Command failed with exit code 1");
}

#[test]
fn test_serialization_skips_empty_fields() {
    let value = serde_json::to_value(ToolResult::text("x")).unwrap();
    assert_eq!(value, serde_json::json!({"content": "x"}));
}
