// ABOUTME: Tests for Subprocess - output capture, input, timeout, output limit.
// ABOUTME: Uses sh so the commands work on any unix host.

use std::time::{Duration, Instant};

use super::*;
use crate::error::ExecError;

fn sh(script: &str) -> Subprocess {
    Subprocess::new(["sh", "-c", script])
}

#[tokio::test]
async fn test_captures_stdout_and_stderr() {
    let result = sh("echo out; echo err 1>&2").run().await.unwrap();
    assert!(result.success);
    assert_eq!(result.returncode, 0);
    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
    assert!(!result.truncated);
}

#[tokio::test]
async fn test_nonzero_exit() {
    let result = sh("exit 3").run().await.unwrap();
    assert!(!result.success);
    assert_eq!(result.returncode, 3);
}

#[tokio::test]
async fn test_input_is_written_to_stdin() {
    let result = Subprocess::new(["cat"])
        .input("piped input")
        .run()
        .await
        .unwrap();
    assert_eq!(result.stdout, "piped input");
}

#[tokio::test]
async fn test_cwd_and_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = sh("pwd; echo $EVALKIT_TEST_VAR")
        .cwd(dir.path())
        .env([("EVALKIT_TEST_VAR", "hello")])
        .run()
        .await
        .unwrap();

    let lines: Vec<_> = result.stdout.lines().collect();
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(
        std::path::Path::new(lines[0]).canonicalize().unwrap(),
        expected
    );
    assert_eq!(lines[1], "hello");
}

#[tokio::test]
async fn test_timeout_fails_with_timeout_error() {
    let start = Instant::now();
    let result = sh("sleep 5")
        .timeout(Duration::from_millis(100))
        .run()
        .await;

    assert!(matches!(result, Err(ExecError::Timeout(d)) if d == Duration::from_millis(100)));
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_output_limit_truncates_and_stops() {
    let start = Instant::now();
    let result = sh("yes")
        .output_limit(1024)
        .timeout(Duration::from_secs(10))
        .run()
        .await
        .unwrap();

    assert!(result.truncated);
    assert_eq!(result.stdout.len(), 1024);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_output_under_limit_not_truncated() {
    let result = sh("printf abc").output_limit(3).run().await.unwrap();
    assert!(!result.truncated);
    assert_eq!(result.stdout, "abc");
}

#[tokio::test]
async fn test_empty_command_rejected() {
    let result = Subprocess::new(Vec::<String>::new()).run().await;
    assert!(matches!(result, Err(ExecError::EmptyCommand)));
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let result = Subprocess::new(["definitely-not-a-real-program-xyz"])
        .run()
        .await;
    assert!(matches!(result, Err(ExecError::Spawn { .. })));
}

#[tokio::test]
async fn test_without_concurrency_gate() {
    let result = sh("echo ok").concurrency(false).run().await.unwrap();
    assert_eq!(result.stdout.trim(), "ok");
}

#[test]
fn test_max_subprocesses_defaults_to_at_least_one() {
    assert!(max_subprocesses() >= 1);
}

#[test]
fn test_combined_output() {
    let result = ExecResult {
        success: true,
        returncode: 0,
        stdout: "a".into(),
        stderr: "b".into(),
        truncated: false,
    };
    assert_eq!(result.combined_output(), "a\nb");
}
