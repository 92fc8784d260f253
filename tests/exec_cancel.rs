mod common;
use crate::common::{MemorySinks, init_tracing, sh, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use procrun::exec::ExecutionEngine;
use tokio::sync::oneshot;

type TestResult = Result<(), Box<dyn Error>>;

/// Cancellation must short-circuit the run promptly instead of waiting out
/// the configured timeout.
#[tokio::test]
async fn cancellation_returns_promptly() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let request = sh("sleep 30")
        .with_timeout(Duration::from_secs(30))
        .with_cancel(cancel_rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = cancel_tx.send(());
    });

    let started = Instant::now();
    let result = with_timeout(engine.execute(request, sinks.sinks())).await?;
    let elapsed = started.elapsed();

    assert!(result.cancelled);
    assert!(!result.timed_out);
    assert!(!result.succeeded());
    assert!(
        elapsed < Duration::from_secs(5),
        "cancellation took {elapsed:?}, should not wait for the 30s timeout"
    );

    let diag = sinks.diagnostic.contents();
    assert!(diag.contains("cancelled"), "diagnostic narration missing: {diag}");
    Ok(())
}

/// Dropping the cancel sender without firing it is not a cancellation; the
/// run completes normally.
#[tokio::test]
async fn dropped_cancel_sender_is_not_a_cancellation() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    drop(cancel_tx);

    let request = sh("echo still-ran").with_cancel(cancel_rx);
    let result = with_timeout(engine.execute(request, sinks.sinks())).await?;

    assert!(result.succeeded());
    assert!(!result.cancelled);
    assert_eq!(sinks.stdout.lines(), vec!["still-ran"]);
    Ok(())
}

/// Cancelling a process that already exited is harmless.
#[tokio::test]
async fn cancel_after_exit_is_harmless() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let request = sh("echo quick").with_cancel(cancel_rx);

    let result = with_timeout(engine.execute(request, sinks.sinks())).await?;
    assert!(result.succeeded());

    // Firing after the call returned goes nowhere.
    let _ = cancel_tx.send(());
    Ok(())
}
