// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `procrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procrun",
    version,
    about = "Run a process with streamed logs, a wall-clock timeout, and tree-kill on expiry.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Procrun.toml` in the current working directory (see
    /// `config::default_config_path`); missing file means built-in
    /// defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Wall-clock timeout in seconds; on expiry the whole process tree is
    /// killed. Omitted (and no config default): wait until exit or Ctrl-C.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Working directory for the child process.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Set an environment variable in the child (repeatable).
    #[arg(long = "env", value_name = "NAME=VALUE")]
    pub env: Vec<String>,

    /// Remove a variable from the child's inherited environment (repeatable).
    #[arg(long = "unset", value_name = "NAME")]
    pub unset: Vec<String>,

    /// Write the child's stdout lines to this file instead of the console.
    #[arg(long, value_name = "PATH")]
    pub stdout_log: Option<String>,

    /// Write the child's stderr lines to this file instead of the console.
    #[arg(long, value_name = "PATH")]
    pub stderr_log: Option<String>,

    /// Write the command line and timeout/cancellation narration here.
    #[arg(long, value_name = "PATH")]
    pub diag_log: Option<String>,

    /// Prefix every logged line with a local-time timestamp.
    #[arg(long)]
    pub timestamps: bool,

    /// Capture kill diagnostics (process snapshot, backtraces) on timeout.
    #[arg(long)]
    pub kill_diagnostics: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Program to run, followed by its arguments.
    #[arg(required = true, trailing_var_arg = true, value_name = "PROGRAM [ARGS]...")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
