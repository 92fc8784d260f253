// src/exec/engine.rs

//! Asynchronous process execution engine.
//!
//! Launches a child process, streams its stdout/stderr into log sinks from
//! one reader task per stream, and races process exit against an optional
//! timeout and an optional cancellation channel:
//!
//! - exit first: normal completion, exit code reported as-is.
//! - timeout first: the whole process tree is killed through the
//!   soft-then-hard escalation in [`crate::proc`], and the result is marked
//!   timed out.
//! - cancellation first: immediate hard kill, no soft-kill phase.
//!
//! Whichever way the race resolves, the engine reaps the child and then
//! waits (bounded) for both reader tasks, so output that was already in the
//! pipe is drained into the sinks before the call returns.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::errors::{ProcrunError, Result};
use crate::exec::quote;
use crate::exec::request::{ExecutionRequest, ExecutionResult, UNKNOWN_EXIT_CODE};
use crate::proc::{KillOptions, kill_tree};
use crate::sink::SharedSink;

/// Engine tuning knobs, applied at construction (no ambient/global state).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounded wait for the stream readers after the exit/timeout/cancel
    /// race has resolved.
    pub drain_wait: Duration,
    /// Capture kill diagnostics (pid list, process snapshot, backtraces)
    /// when a timeout triggers a tree kill.
    pub diagnostics_on_timeout: bool,
    /// Bound on the process-table query used for tree discovery.
    pub ps_timeout: Duration,
    /// Bound on each debugger backtrace attempt during kill diagnostics.
    pub debugger_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drain_wait: Duration::from_secs(1),
            diagnostics_on_timeout: false,
            ps_timeout: Duration::from_secs(1),
            debugger_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    fn kill_options(&self) -> KillOptions {
        KillOptions {
            diagnostics: self.diagnostics_on_timeout,
            ps_timeout: self.ps_timeout,
            debugger_timeout: self.debugger_timeout,
        }
    }
}

/// Sinks for one execution.
///
/// `stdout` and `stderr` may be the same sink; `diagnostic` (if present)
/// receives the composed command line, the env overrides, and any
/// timeout/cancellation narration.
pub struct ExecutionSinks {
    pub stdout: SharedSink,
    pub stderr: SharedSink,
    pub diagnostic: Option<SharedSink>,
}

impl ExecutionSinks {
    pub fn new(stdout: SharedSink, stderr: SharedSink) -> Self {
        Self {
            stdout,
            stderr,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: SharedSink) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    fn narrate(&self, line: &str) {
        if let Some(diag) = &self.diagnostic {
            diag.write_line(line);
            diag.flush();
        }
    }
}

/// How the exit/timeout/cancel race resolved.
enum Resolution {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

pub struct ExecutionEngine {
    config: EngineConfig,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run one request to completion.
    ///
    /// Returns `Err` only for failures of the primary path (the program
    /// could not be launched, or waiting on the child itself failed).
    /// Timeouts and cancellations are reported through the result flags,
    /// and cleanup failures are logged, never propagated.
    pub async fn execute(
        &self,
        request: ExecutionRequest,
        sinks: ExecutionSinks,
    ) -> Result<ExecutionResult> {
        let ExecutionRequest {
            program,
            args,
            cwd,
            env,
            timeout: time_limit,
            cancel,
        } = request;

        // Announce the command line and env overrides up front so a log of
        // a failed run always starts with how to reproduce it.
        let cmd_line = quote::join(&program.to_string_lossy(), &args);
        if let Some(diag) = &sinks.diagnostic {
            diag.write_line(&format!("$ {cmd_line}"));
            for (name, value) in &env {
                match value {
                    Some(v) => diag.write_line(&format!("env: {name}={v}")),
                    None => diag.write_line(&format!("env: unset {name}")),
                }
            }
            diag.flush();
        }

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &cwd {
            cmd.current_dir(cwd);
        }
        for (name, value) in &env {
            match value {
                Some(v) => {
                    cmd.env(name, v);
                }
                None => {
                    cmd.env_remove(name);
                }
            }
        }

        let mut child = cmd.spawn().map_err(|source| ProcrunError::LaunchFailure {
            program: program.clone(),
            source,
        })?;

        let pid = child.id();
        info!(program = %program.display(), pid, cmd = %cmd_line, "process started");

        let stdout_reader = spawn_reader("stdout", child.stdout.take(), sinks.stdout.clone());
        let stderr_reader = spawn_reader("stderr", child.stderr.take(), sinks.stderr.clone());

        // Race: cancellation vs exit vs timeout. `biased` polls in listed
        // order, so a cancellation that ties with the timeout always wins.
        let mut cancel_rx = cancel;
        let resolution = {
            let cancel_fired = async {
                match &mut cancel_rx {
                    Some(rx) => match rx.await {
                        Ok(()) => {}
                        // Sender dropped without firing: not a cancellation.
                        Err(_) => std::future::pending::<()>().await,
                    },
                    None => std::future::pending::<()>().await,
                }
            };
            let timeout_elapsed = async {
                match time_limit {
                    Some(limit) => sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::pin!(cancel_fired);
            tokio::pin!(timeout_elapsed);

            tokio::select! {
                biased;

                _ = &mut cancel_fired => Resolution::Cancelled,
                status = child.wait() => {
                    let status = status.with_context(|| {
                        format!("waiting for process of '{}'", program.display())
                    })?;
                    Resolution::Exited(status)
                }
                _ = &mut timeout_elapsed => Resolution::TimedOut,
            }
        };

        let (status, resolution) = match resolution {
            Resolution::Exited(status) => (Some(status), Resolution::Exited(status)),

            Resolution::TimedOut => {
                let secs = time_limit.unwrap_or_default().as_secs_f64();
                warn!(pid, timeout_secs = secs, "execution timed out; killing process tree");
                sinks.narrate(&format!(
                    "execution timed out after {secs}s and the process was killed (pid {})",
                    pid.map_or_else(|| "unknown".to_string(), |p| p.to_string()),
                ));

                self.kill_child_tree(pid, &mut child).await;
                let status = self.reap(&mut child, pid).await;
                (status, Resolution::TimedOut)
            }

            Resolution::Cancelled => {
                info!(pid, "cancellation requested; killing process");
                sinks.narrate("execution cancelled; killing process");

                // A transient try_wait error is treated as "still running"
                // so the kill is never skipped on a flaky handle.
                let already_exited = match child.try_wait() {
                    Ok(Some(_)) => true,
                    Ok(None) => false,
                    Err(e) => {
                        debug!(pid, error = %e, "try_wait failed; assuming still running");
                        false
                    }
                };
                if !already_exited {
                    if let Err(e) = child.kill().await {
                        warn!(pid, error = %e, "failed to kill child on cancellation");
                    }
                }
                let status = self.reap(&mut child, pid).await;
                (status, Resolution::Cancelled)
            }
        };

        // Bounded wait for the reader tasks, so output already in the pipes
        // reaches the sinks before the result is constructed.
        let drained = timeout(self.config.drain_wait, async {
            if let Some(handle) = stdout_reader {
                let _ = handle.await;
            }
            if let Some(handle) = stderr_reader {
                let _ = handle.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                pid,
                drain_wait = ?self.config.drain_wait,
                "output streams did not drain in time; output may be truncated"
            );
        }
        sinks.stdout.flush();
        sinks.stderr.flush();

        let exit_code = read_exit_code(status, pid);
        let result = match resolution {
            Resolution::Exited(_) => ExecutionResult::exited(exit_code),
            Resolution::TimedOut => ExecutionResult::timed_out(exit_code),
            Resolution::Cancelled => ExecutionResult::cancelled(exit_code),
        };

        info!(
            pid,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            cancelled = result.cancelled,
            "process execution finished"
        );
        Ok(result)
    }

    /// Kill the child's whole process tree (timeout path).
    ///
    /// Tree discovery and signalling are blocking, so they run on the
    /// blocking pool. Without a pid (already reaped), fall back to killing
    /// just the immediate child handle.
    async fn kill_child_tree(&self, pid: Option<u32>, child: &mut tokio::process::Child) {
        match pid {
            Some(pid) => {
                let options = self.config.kill_options();
                let join = tokio::task::spawn_blocking(move || kill_tree(pid, &options)).await;
                if let Err(e) = join {
                    warn!(pid, error = %e, "kill task failed");
                }
            }
            None => {
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "start_kill failed; child already gone");
                }
            }
        }
    }

    /// Reap the child after a kill; failures are logged, not propagated.
    async fn reap(
        &self,
        child: &mut tokio::process::Child,
        pid: Option<u32>,
    ) -> Option<ExitStatus> {
        match child.wait().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(pid, error = %e, "failed to reap killed process");
                None
            }
        }
    }
}

/// Read the final exit code defensively.
///
/// A missing status (wait failed after a hard kill) or a signal death
/// (no code on Unix) both collapse into [`UNKNOWN_EXIT_CODE`].
fn read_exit_code(status: Option<ExitStatus>, pid: Option<u32>) -> i32 {
    match status {
        Some(status) => match status.code() {
            Some(code) => code,
            None => {
                debug!(pid, %status, "no exit code available (terminated by signal)");
                UNKNOWN_EXIT_CODE
            }
        },
        None => {
            warn!(pid, "exit code could not be read; substituting sentinel");
            UNKNOWN_EXIT_CODE
        }
    }
}

/// Spawn one line-reader task for a child output stream.
///
/// Each line is written to the sink and flushed immediately, so a child
/// that later hangs never leaves already-emitted output unflushed. The
/// returned handle resolves once the stream hits end-of-file, which is the
/// engine's "this stream is fully drained" flag.
fn spawn_reader<R>(
    stream: &'static str,
    pipe: Option<R>,
    sink: SharedSink,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let pipe = pipe?;
    Some(tokio::spawn(async move {
        let reader = BufReader::new(pipe);
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    sink.write_line(&line);
                    sink.flush();
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(stream, error = %e, "error reading process output; stopping reader");
                    break;
                }
            }
        }
    }))
}
