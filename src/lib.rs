// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod proc;
pub mod sink;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::info;

use crate::cli::CliArgs;
use crate::errors::{ProcrunError, Result};
use crate::exec::{ExecutionEngine, ExecutionRequest, ExecutionSinks};
use crate::sink::{CallbackSink, FileSink, SharedSink};

/// Exit status the CLI reports for a timed-out run (coreutils `timeout`
/// convention).
pub const TIMEOUT_EXIT_CODE: i32 = 124;
/// Exit status the CLI reports when the run was cancelled via Ctrl-C.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (`Procrun.toml`, optional)
/// - sink construction (file-backed or console echo)
/// - Ctrl-C -> cancellation channel
/// - the execution engine
///
/// Returns the exit code the CLI process should report.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_or_default(&config_path)?;

    let mut engine_cfg = cfg.engine.engine_config();
    if args.kill_diagnostics {
        engine_cfg.diagnostics_on_timeout = true;
    }

    let Some((program, prog_args)) = args.command.split_first() else {
        return Err(ProcrunError::ConfigError(
            "no program given to run".to_string(),
        ));
    };

    let mut request = ExecutionRequest::new(program).with_args(prog_args.iter().cloned());
    if let Some(cwd) = &args.cwd {
        request = request.with_cwd(cwd);
    }
    for pair in &args.env {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(ProcrunError::ConfigError(format!(
                "invalid --env '{pair}' (expected NAME=VALUE)"
            )));
        };
        request = request.with_env(name, value);
    }
    for name in &args.unset {
        request = request.without_env(name);
    }
    if let Some(secs) = args.timeout.or(cfg.defaults.timeout_secs) {
        request = request.with_timeout(Duration::from_secs(secs));
    }

    // Ctrl-C -> immediate hard kill via the cancellation channel.
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    request = request.with_cancel(cancel_rx);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received; cancelling execution");
            let _ = cancel_tx.send(());
        }
    });

    let timestamps = args.timestamps || cfg.defaults.timestamps;
    let stdout_sink = line_sink("stdout", args.stdout_log.as_deref(), timestamps, false)?;
    let stderr_sink = line_sink("stderr", args.stderr_log.as_deref(), timestamps, true)?;
    let mut sinks = ExecutionSinks::new(stdout_sink, stderr_sink);
    if let Some(path) = &args.diag_log {
        let diag: SharedSink = Arc::new(FileSink::create("diagnostic", path)?.with_timestamps(timestamps));
        sinks = sinks.with_diagnostic(diag);
    }

    let engine = ExecutionEngine::new(engine_cfg);
    let result = engine.execute(request, sinks).await?;

    let code = if result.cancelled {
        CANCELLED_EXIT_CODE
    } else if result.timed_out {
        TIMEOUT_EXIT_CODE
    } else if result.exit_code < 0 {
        // Sentinel / signal death: report a plain failure.
        1
    } else {
        result.exit_code
    };
    Ok(code)
}

/// File sink when a path was given, console echo otherwise.
fn line_sink(
    description: &'static str,
    path: Option<&str>,
    timestamps: bool,
    to_stderr: bool,
) -> Result<SharedSink> {
    let sink: SharedSink = match path {
        Some(path) => Arc::new(FileSink::create(description, path)?.with_timestamps(timestamps)),
        None if to_stderr => Arc::new(
            CallbackSink::new(description, |line| eprintln!("{line}")).with_timestamps(timestamps),
        ),
        None => Arc::new(
            CallbackSink::new(description, |line| println!("{line}")).with_timestamps(timestamps),
        ),
    };
    Ok(sink)
}
