// src/proc/kill.rs

//! Termination escalation.
//!
//! A timed-out process gets a two-phase kill: SIGABRT first, so still-alive
//! processes leave a crash artifact for post-mortem analysis, then an
//! unconditional SIGKILL. Killing an already-dead pid is a no-op at every
//! step; cleanup failures are logged at low severity and never propagate.

use std::time::Duration;
#[cfg(unix)]
use std::time::Instant;

use tracing::info;
#[cfg(unix)]
use tracing::debug;

#[cfg(unix)]
use super::tree::descendants;
use super::tree::run_bounded;

/// Options for [`kill_tree`].
#[derive(Debug, Clone)]
pub struct KillOptions {
    /// Capture a pid list, a process-table snapshot, and best-effort
    /// debugger backtraces of still-alive processes before killing.
    pub diagnostics: bool,
    /// Bound on the process-table query used for tree discovery.
    pub ps_timeout: Duration,
    /// Bound on each debugger backtrace attempt.
    pub debugger_timeout: Duration,
}

impl Default for KillOptions {
    fn default() -> Self {
        Self {
            diagnostics: false,
            ps_timeout: Duration::from_secs(1),
            debugger_timeout: Duration::from_secs(30),
        }
    }
}

/// Kill `root` and every discovered descendant.
///
/// Tree discovery failures degrade to killing just the root; signal
/// failures for pids that exited in between are ignored.
#[cfg(unix)]
pub fn kill_tree(root: u32, options: &KillOptions) {
    let pids = descendants(root, options.ps_timeout);
    info!(root, ?pids, "killing process tree");

    if options.diagnostics {
        capture_diagnostics(&pids, options);
    }

    // Soft-hard first: SIGABRT still produces a crash artifact.
    for &pid in &pids {
        send_signal(pid, libc::SIGABRT);
    }
    // Then the unrecoverable kill, unconditionally.
    for &pid in &pids {
        send_signal(pid, libc::SIGKILL);
    }
}

/// Degraded fallback where per-process enumeration is unreliable: lean on
/// the OS "kill entire tree" primitive for the root alone.
#[cfg(not(unix))]
pub fn kill_tree(root: u32, options: &KillOptions) {
    info!(root, "killing process tree via taskkill");
    let _ = run_bounded(
        "taskkill",
        &["/t", "/f", "/pid", &root.to_string()],
        options.ps_timeout.max(Duration::from_secs(5)),
    );
}

/// True when `pid` still exists (signal 0 probe).
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: i32) {
    let rc = unsafe { libc::kill(pid as i32, signal) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: the pid exited between discovery and kill.
        if err.raw_os_error() != Some(libc::ESRCH) {
            debug!(pid, signal, error = %err, "kill failed");
        }
    }
}

/// Best-effort diagnostics before the kill.
///
/// Snapshots the full process table and tries to attach a debugger to each
/// still-alive pid for a thread backtrace. Attach failures (privileged or
/// system processes) are discarded silently.
#[cfg(unix)]
fn capture_diagnostics(pids: &[u32], options: &KillOptions) {
    // The snapshot is the post-mortem artifact the caller asked for, so it
    // goes out at the same level as the backtraces.
    if let Some(snapshot) = run_bounded("ps", &["aux"], options.ps_timeout) {
        info!(snapshot = %snapshot, "process table before kill");
    }

    for &pid in pids {
        if !is_alive(pid) {
            continue;
        }
        if let Some(backtrace) = capture_backtrace(pid, options.debugger_timeout) {
            info!(pid, backtrace = %backtrace, "thread backtrace before kill");
        }
    }
}

/// Attach a symbolic debugger to `pid` and capture a backtrace of all
/// threads, bounded by `limit`.
#[cfg(unix)]
fn capture_backtrace(pid: u32, limit: Duration) -> Option<String> {
    let pid_arg = pid.to_string();
    let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
        (
            "lldb",
            vec![
                "-p", &pid_arg, "--batch", "-o", "thread backtrace all", "-o", "detach", "-o",
                "quit",
            ],
        )
    } else {
        (
            "gdb",
            vec!["-p", &pid_arg, "-batch", "-ex", "thread apply all bt"],
        )
    };

    let started = Instant::now();
    let output = run_bounded(program, &args, limit);
    debug!(pid, elapsed = ?started.elapsed(), captured = output.is_some(), "debugger attach finished");
    output
}
