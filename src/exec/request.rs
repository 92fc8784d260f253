// src/exec/request.rs

//! Execution request/result model.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;

/// Sentinel exit code used when the real code could not be read (the OS
/// handle is typically invalidated by a hard kill). Unix exit codes are
/// 0-255, so -1 never collides with a real one.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// One process execution: what to run, where, with which environment, and
/// for how long.
///
/// Built with the `with_*` methods:
///
/// ```no_run
/// use std::time::Duration;
/// use procrun::exec::ExecutionRequest;
///
/// let req = ExecutionRequest::new("adb")
///     .with_args(["devices", "-l"])
///     .with_timeout(Duration::from_secs(30))
///     .with_env("ADB_TRACE", "all");
/// ```
pub struct ExecutionRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// `Some(value)` sets/overwrites the variable; `None` removes it from
    /// the child's inherited environment.
    pub env: BTreeMap<String, Option<String>>,
    /// Absent means "wait until exit or external cancellation".
    pub timeout: Option<Duration>,
    /// One-shot external cancellation; firing it hard-kills the child.
    pub cancel: Option<oneshot::Receiver<()>>,
}

impl ExecutionRequest {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            timeout: None,
            cancel: None,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set (or overwrite) an environment variable in the child.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), Some(value.into()));
        self
    }

    /// Remove a variable from the child's inherited environment.
    pub fn without_env(mut self, name: impl Into<String>) -> Self {
        self.env.insert(name.into(), None);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: oneshot::Receiver<()>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Outcome of one execution.
///
/// The exit code is only meaningful when neither `timed_out` nor `cancelled`
/// is set; after a kill it is usually [`UNKNOWN_EXIT_CODE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl ExecutionResult {
    pub(crate) fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            timed_out: false,
            cancelled: false,
        }
    }

    pub(crate) fn timed_out(exit_code: i32) -> Self {
        Self {
            exit_code,
            timed_out: true,
            cancelled: false,
        }
    }

    pub(crate) fn cancelled(exit_code: i32) -> Self {
        Self {
            exit_code,
            timed_out: false,
            cancelled: true,
        }
    }

    /// Clean exit with code zero, neither timed out nor cancelled.
    pub fn succeeded(&self) -> bool {
        !self.timed_out && !self.cancelled && self.exit_code == 0
    }
}
