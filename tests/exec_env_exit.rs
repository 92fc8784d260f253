mod common;
use crate::common::{MemorySinks, init_tracing, sh, with_timeout};

use std::error::Error;

use procrun::errors::ProcrunError;
use procrun::exec::{ExecutionEngine, ExecutionRequest};

type TestResult = Result<(), Box<dyn Error>>;

/// `Some(value)` overrides set variables; `None` overrides remove them from
/// the inherited environment.
#[tokio::test]
async fn env_overrides_set_and_unset() -> TestResult {
    init_tracing();

    // Ambient variable the child must NOT see.
    unsafe { std::env::set_var("PROCRUN_TEST_BAZ", "qux") };

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let request = sh("echo FOO=${PROCRUN_TEST_FOO:-missing}; echo BAZ=${PROCRUN_TEST_BAZ:-missing}")
        .with_env("PROCRUN_TEST_FOO", "bar")
        .without_env("PROCRUN_TEST_BAZ");

    let result = with_timeout(engine.execute(request, sinks.sinks())).await?;
    assert!(result.succeeded());
    assert_eq!(sinks.stdout.lines(), vec!["FOO=bar", "BAZ=missing"]);

    // Overrides are mirrored into the diagnostic log for reproducibility.
    let diag = sinks.diagnostic.contents();
    assert!(diag.contains("env: PROCRUN_TEST_FOO=bar"));
    assert!(diag.contains("env: unset PROCRUN_TEST_BAZ"));
    Ok(())
}

/// The exact exit code is reported, and nonzero means not succeeded.
#[tokio::test]
async fn exit_code_is_reported_exactly() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let result = with_timeout(engine.execute(sh("exit 42"), sinks.sinks())).await?;
    assert_eq!(result.exit_code, 42);
    assert!(!result.timed_out);
    assert!(!result.succeeded());
    Ok(())
}

/// A missing binary is a distinct launch failure naming the program, never
/// a generic "ran and failed".
#[tokio::test]
async fn missing_binary_is_a_launch_failure() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let request = ExecutionRequest::new("/definitely/not/a/real/binary");
    let err = with_timeout(engine.execute(request, sinks.sinks()))
        .await
        .expect_err("spawn should fail");

    assert!(err.is_launch_failure());
    match err {
        ProcrunError::LaunchFailure { program, .. } => {
            assert_eq!(program.to_string_lossy(), "/definitely/not/a/real/binary");
        }
        other => panic!("expected LaunchFailure, got {other:?}"),
    }
    Ok(())
}

/// The child runs in the requested working directory.
#[tokio::test]
async fn cwd_is_applied() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let request = sh("pwd").with_cwd(dir.path());
    let result = with_timeout(engine.execute(request, sinks.sinks())).await?;

    assert!(result.succeeded());
    let lines = sinks.stdout.lines();
    assert_eq!(lines.len(), 1);
    // Compare canonicalised paths; macOS tempdirs go through /private.
    assert_eq!(
        std::fs::canonicalize(&lines[0])?,
        std::fs::canonicalize(dir.path())?
    );
    Ok(())
}
