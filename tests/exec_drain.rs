mod common;
use crate::common::{MemorySinks, init_tracing, sh, with_timeout};

use std::error::Error;
use std::sync::Arc;

use procrun::exec::ExecutionEngine;
use procrun::sink::MemorySink;

type TestResult = Result<(), Box<dyn Error>>;

/// A child that writes far more than an OS pipe buffer and then exits must
/// have every line in the sink, in emission order, once the call returns.
#[tokio::test]
async fn all_stdout_lines_arrive_in_order() -> TestResult {
    init_tracing();

    const K: usize = 100_000;

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let result = with_timeout(engine.execute(sh(&format!("seq 1 {K}")), sinks.sinks())).await?;
    assert!(result.succeeded());

    let lines = sinks.stdout.lines();
    assert_eq!(lines.len(), K);
    assert_eq!(lines[0], "1");
    assert_eq!(lines[K - 1], K.to_string());
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line, &(i + 1).to_string(), "line {i} out of order");
    }
    Ok(())
}

#[tokio::test]
async fn stderr_is_routed_to_its_own_sink() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    let result = with_timeout(
        engine.execute(sh("echo to-stdout; echo to-stderr 1>&2"), sinks.sinks()),
    )
    .await?;

    assert!(result.succeeded());
    assert_eq!(sinks.stdout.lines(), vec!["to-stdout"]);
    assert_eq!(sinks.stderr.lines(), vec!["to-stderr"]);
    Ok(())
}

/// stdout and stderr may share one sink; both streams' lines land in it.
#[tokio::test]
async fn streams_can_share_a_sink() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let shared = Arc::new(MemorySink::new("combined"));
    let sinks = procrun::exec::ExecutionSinks::new(shared.clone(), shared.clone());

    let result = with_timeout(
        engine.execute(sh("echo one; echo two 1>&2; echo three"), sinks),
    )
    .await?;

    assert!(result.succeeded());
    let mut lines = shared.lines();
    lines.sort();
    assert_eq!(lines, vec!["one", "three", "two"]);
    Ok(())
}

/// The diagnostic sink carries the reproducible command line before any
/// child output arrives.
#[tokio::test]
async fn diagnostic_sink_announces_the_command_line() -> TestResult {
    init_tracing();

    let engine = ExecutionEngine::default();
    let sinks = MemorySinks::new();

    with_timeout(engine.execute(sh("true"), sinks.sinks())).await?;

    let diag = sinks.diagnostic.contents();
    assert!(diag.starts_with("$ sh -c true"), "unexpected diagnostic: {diag}");
    Ok(())
}
