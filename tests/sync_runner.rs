mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::time::{Duration, Instant};

use procrun::errors::ProcrunError;
use procrun::exec::SyncRunner;

type TestResult = Result<(), Box<dyn Error>>;

fn args(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}

#[test]
fn captures_stdout_and_stderr() -> TestResult {
    init_tracing();

    let runner = SyncRunner::default();
    let output = runner.run("sh", &args("echo out; echo err 1>&2"), Duration::from_secs(30))?;

    assert!(output.succeeded());
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
    Ok(())
}

/// The classic deadlock case: a child emitting far more than the OS pipe
/// buffer while the parent waits for exit. The reader threads must keep
/// draining, and every line must be present afterwards.
#[test]
fn large_output_does_not_deadlock() -> TestResult {
    init_tracing();

    const K: usize = 100_000;

    let runner = SyncRunner::default();
    let output = runner.run("sh", &args(&format!("seq 1 {K}")), Duration::from_secs(30))?;

    assert!(output.succeeded());
    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines.len(), K);
    assert_eq!(lines[0], "1");
    assert_eq!(lines[K - 1], K.to_string());
    Ok(())
}

#[test]
fn timeout_kills_and_flags() -> TestResult {
    init_tracing();

    let runner = SyncRunner::default();
    let started = Instant::now();
    let output = runner.run("sh", &args("echo before; sleep 30"), Duration::from_millis(500))?;

    assert!(output.timed_out);
    assert!(!output.succeeded());
    // Output emitted before the kill is still captured.
    assert_eq!(output.stdout, "before\n");
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "blocking run should not wait out the sleep"
    );
    Ok(())
}

#[test]
fn exit_code_is_preserved() -> TestResult {
    init_tracing();

    let runner = SyncRunner::default();
    let output = runner.run("sh", &args("exit 7"), Duration::from_secs(30))?;

    assert_eq!(output.exit_code, 7);
    assert!(!output.timed_out);
    assert!(!output.succeeded());
    Ok(())
}

/// A child that exits almost immediately must still have its output
/// captured; the attach handshake guarantees the readers were wired up
/// before the timeout clock even started.
#[test]
fn very_short_lived_process_output_is_captured() -> TestResult {
    init_tracing();

    let runner = SyncRunner::default();
    for _ in 0..10 {
        let output = runner.run("sh", &args("echo instant"), Duration::from_secs(5))?;
        assert!(output.succeeded());
        assert_eq!(output.stdout, "instant\n");
    }
    Ok(())
}

#[test]
fn missing_binary_is_a_launch_failure() -> TestResult {
    init_tracing();

    let runner = SyncRunner::default();
    let err = runner
        .run("/no/such/tool", &[], Duration::from_secs(1))
        .expect_err("spawn should fail");

    assert!(matches!(err, ProcrunError::LaunchFailure { .. }));
    Ok(())
}
