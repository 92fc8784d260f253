// src/sink/mod.rs

//! Log sink abstraction.
//!
//! Child-process output is streamed line by line into *sinks* as it arrives.
//! The engine's reader tasks write from background Tokio tasks, so every
//! implementation locks internally; a sink may be shared between stdout and
//! stderr of one execution, or between several concurrent executions (e.g.
//! one combined diagnostic log per test session).
//!
//! - [`memory`] keeps lines in a `Vec<String>` for in-process inspection.
//! - [`file`] appends to a file, flushing after every line so a hanging
//!   child never leaves output stuck in a buffer.
//! - [`callback`] forwards each line to a caller-supplied closure.

pub mod callback;
pub mod file;
pub mod memory;

pub use callback::CallbackSink;
pub use file::FileSink;
pub use memory::MemorySink;

use std::sync::Arc;

/// Destination for streamed process-output lines.
///
/// Implementations must be safe to call from multiple threads/tasks at once;
/// `write_line` and `flush` are mutually exclusive with each other and with
/// any owner-side reads.
pub trait LogSink: Send + Sync {
    /// Append a single line (without trailing newline).
    fn write_line(&self, line: &str);

    /// Flush buffered data to the backing store. No-op for sinks without
    /// their own buffering.
    fn flush(&self);

    /// Human-readable tag used in diagnostics ("stdout of adb", ...).
    fn description(&self) -> &str;
}

/// Shared sink handle, as passed to the execution engine.
pub type SharedSink = Arc<dyn LogSink>;

/// Format a timestamp prefix for a line, if `timestamps` is enabled.
pub(crate) fn stamp(timestamps: bool, line: &str) -> String {
    if timestamps {
        let now = chrono::Local::now().format("%H:%M:%S%.3f");
        format!("{now} {line}")
    } else {
        line.to_string()
    }
}
