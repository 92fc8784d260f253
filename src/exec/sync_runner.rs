// src/exec/sync_runner.rs

//! Fully-blocking runner used by callers without an async runtime (the
//! device-tool wrapper path).
//!
//! Naive synchronous execution deadlocks once a chatty child fills the OS
//! pipe buffer while the parent is blocked in `wait()`. So this runner
//! attaches one reader *thread* per stream before blocking, exactly like
//! the async engine attaches reader tasks, and returns the accumulated
//! output as in-memory strings instead of streaming it to sinks.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::errors::{ProcrunError, Result};
use crate::exec::quote;
use crate::exec::request::UNKNOWN_EXIT_CODE;
use crate::proc::{KillOptions, kill_tree};

/// How long to wait for both reader threads to confirm attachment before
/// the timeout clock starts. Replaces the historical fixed post-start
/// sleep with an explicit readiness signal.
const ATTACH_WAIT: Duration = Duration::from_secs(1);

/// Poll interval for `try_wait` while blocking on exit.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Bounded join for reader threads after the process is gone.
const READER_JOIN_WAIT: Duration = Duration::from_secs(1);

/// Result of a blocking run, with output embedded rather than streamed.
#[derive(Debug, Clone)]
pub struct SyncOutput {
    pub exit_code: i32,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
}

impl SyncOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

pub struct SyncRunner {
    kill_options: KillOptions,
}

impl Default for SyncRunner {
    fn default() -> Self {
        Self {
            kill_options: KillOptions::default(),
        }
    }
}

impl SyncRunner {
    pub fn new(kill_options: KillOptions) -> Self {
        Self { kill_options }
    }

    /// Run `program` with `args`, blocking until exit or timeout.
    ///
    /// On timeout the process tree is killed and `timed_out` is set; the
    /// accumulated output still contains everything the child wrote before
    /// it died.
    pub fn run(
        &self,
        program: impl AsRef<Path>,
        args: &[String],
        time_limit: Duration,
    ) -> Result<SyncOutput> {
        let program: PathBuf = program.as_ref().to_path_buf();
        let cmd_line = quote::join(&program.to_string_lossy(), args);
        info!(cmd = %cmd_line, "running process (blocking)");

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcrunError::LaunchFailure {
                program: program.clone(),
                source,
            })?;

        let pid = child.id();

        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));

        let (attach_tx, attach_rx) = mpsc::channel::<()>();
        let stdout_thread = child
            .stdout
            .take()
            .map(|pipe| spawn_reader("stdout", pipe, stdout_buf.clone(), attach_tx.clone()));
        let stderr_thread = child
            .stderr
            .take()
            .map(|pipe| spawn_reader("stderr", pipe, stderr_buf.clone(), attach_tx));

        // Wait until both readers confirm they are attached, so the timeout
        // clock never starts before output can be observed. A reader that
        // fails to start degrades into the bounded wait.
        let expected = stdout_thread.is_some() as usize + stderr_thread.is_some() as usize;
        let attach_deadline = Instant::now() + ATTACH_WAIT;
        for _ in 0..expected {
            let remaining = attach_deadline.saturating_duration_since(Instant::now());
            if attach_rx.recv_timeout(remaining).is_err() {
                debug!(pid, "reader attach signal missing; proceeding anyway");
                break;
            }
        }

        // Block on exit, polling against the deadline.
        let deadline = Instant::now() + time_limit;
        let mut timed_out = false;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        warn!(
                            pid,
                            timeout_secs = time_limit.as_secs_f64(),
                            "blocking run timed out; killing process tree"
                        );
                        timed_out = true;
                        kill_tree(pid, &self.kill_options);
                        // Reap so the pid is not left as a zombie.
                        match child.wait() {
                            Ok(status) => break Some(status),
                            Err(e) => {
                                warn!(pid, error = %e, "failed to reap killed process");
                                break None;
                            }
                        }
                    }
                    std::thread::sleep(WAIT_POLL);
                }
                Err(e) => {
                    warn!(pid, error = %e, "try_wait failed; falling back to wait()");
                    break child.wait().ok();
                }
            }
        };

        // Both pipes close once the process (and its tree) is gone, so the
        // reader threads finish on their own; the join is bounded anyway.
        join_reader(stdout_thread, pid);
        join_reader(stderr_thread, pid);

        let exit_code = match status.and_then(|s| s.code()) {
            Some(code) => code,
            None => {
                debug!(pid, "exit code unavailable; substituting sentinel");
                UNKNOWN_EXIT_CODE
            }
        };

        let stdout = stdout_buf.lock().expect("output lock poisoned").clone();
        let stderr = stderr_buf.lock().expect("output lock poisoned").clone();

        info!(pid, exit_code, timed_out, "blocking run finished");
        Ok(SyncOutput {
            exit_code,
            timed_out,
            stdout,
            stderr,
        })
    }
}

/// Reader thread: signal attachment, then append lines to a locked buffer.
fn spawn_reader<R>(
    stream: &'static str,
    pipe: R,
    buf: Arc<Mutex<String>>,
    attach_tx: mpsc::Sender<()>,
) -> std::thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        // Attachment signal goes out before the first blocking read.
        let _ = attach_tx.send(());

        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    let mut buf = buf.lock().expect("output lock poisoned");
                    buf.push_str(&line);
                    buf.push('\n');
                }
                Err(e) => {
                    debug!(stream, error = %e, "error reading process output; stopping reader");
                    break;
                }
            }
        }
    })
}

/// Join a reader thread, bounded so a pipe held open by an orphaned
/// grandchild cannot block the caller forever.
fn join_reader(thread: Option<std::thread::JoinHandle<()>>, pid: u32) {
    let Some(thread) = thread else { return };

    let deadline = Instant::now() + READER_JOIN_WAIT;
    while !thread.is_finished() {
        if Instant::now() >= deadline {
            warn!(pid, "reader thread did not finish in time; output may be truncated");
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    let _ = thread.join();
}
