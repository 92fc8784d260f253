// src/sink/memory.rs

//! In-memory log sink.

use std::sync::Mutex;

use super::{LogSink, stamp};

/// Accumulates lines in memory for later inspection.
///
/// This is the sink used by tests and by callers that want to scan the
/// output after the run (e.g. looking for a completion sentinel).
pub struct MemorySink {
    description: String,
    timestamps: bool,
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamps: false,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Prefix each line with a local-time timestamp.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// Snapshot of the accumulated lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink lock poisoned").clone()
    }

    /// All accumulated output joined with newlines.
    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }

    /// Number of lines received so far.
    pub fn len(&self) -> usize {
        self.lines.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        let line = stamp(self.timestamps, line);
        self.lines.lock().expect("sink lock poisoned").push(line);
    }

    fn flush(&self) {
        // Nothing buffered beyond the Vec itself.
    }

    fn description(&self) -> &str {
        &self.description
    }
}
