//! Integration tests for ProcessRunner against real child processes
//!
//! Uses `/bin/sh` scripts as stand-ins for the conversion tools.

#![cfg(unix)]

use camino::Utf8PathBuf;
use pbitconv::services::{ProcessRunner, ToolError, ToolInvocation, ToolRunner};
use std::time::{Duration, Instant};

fn shell(script: &str) -> ToolInvocation {
    ToolInvocation::new("/bin/sh", ["-c", script])
}

#[tokio::test]
async fn test_captures_exit_code_and_streams() {
    let runner = ProcessRunner::new();

    let output = runner
        .run(&shell("echo converted; echo 'Model required: V3' >&2; exit 3"))
        .await
        .unwrap();

    assert_eq!(output.exit_code, Some(3));
    assert!(!output.success());
    assert_eq!(output.stdout.trim(), "converted");
    assert_eq!(output.stderr.trim(), "Model required: V3");
    assert_eq!(output.combined(), "converted\nModel required: V3");
}

#[tokio::test]
async fn test_success_exit() {
    let runner = ProcessRunner::new().with_timeout(Some(Duration::from_secs(30)));

    let output = runner.run(&shell("exit 0")).await.unwrap();

    assert!(output.success());
    assert_eq!(output.exit_description(), "exit code 0");
}

#[tokio::test]
async fn test_timeout_kills_tool() {
    let runner = ProcessRunner::new().with_timeout(Some(Duration::from_millis(200)));

    let start = Instant::now();
    let result = runner.run(&shell("sleep 30")).await;

    assert!(matches!(result, Err(ToolError::Timeout(_))));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_missing_program_is_launch_error() {
    let runner = ProcessRunner::new();
    let invocation = ToolInvocation::new(
        Utf8PathBuf::from("/nonexistent/pbi-tools"),
        ["extract", "report.pbix"],
    );

    let result = runner.run(&invocation).await;

    match result {
        Err(ToolError::Launch { program, .. }) => {
            assert_eq!(program, "/nonexistent/pbi-tools");
        }
        other => panic!("expected launch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_arguments_passed_verbatim() {
    let runner = ProcessRunner::new();
    let invocation = ToolInvocation::new(
        "/bin/sh",
        ["-c", "printf '%s|' \"$@\"", "sh", "Sales Report.pbix", "-extractFolder"],
    );

    let output = runner.run(&invocation).await.unwrap();

    assert_eq!(output.stdout, "Sales Report.pbix|-extractFolder|");
}
