// src/sink/callback.rs

//! Callback-based log sink.

use std::sync::Mutex;

use super::{LogSink, stamp};

type LineCallback = Box<dyn FnMut(&str) + Send>;

/// Forwards every line to a caller-supplied closure.
///
/// Used by callers that react to output as it streams (e.g. scanning for a
/// completion sentinel) instead of inspecting it afterwards.
pub struct CallbackSink {
    description: String,
    timestamps: bool,
    callback: Mutex<LineCallback>,
}

impl CallbackSink {
    pub fn new(description: impl Into<String>, callback: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            description: description.into(),
            timestamps: false,
            callback: Mutex::new(Box::new(callback)),
        }
    }

    /// Prefix each line with a local-time timestamp.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

impl LogSink for CallbackSink {
    fn write_line(&self, line: &str) {
        let line = stamp(self.timestamps, line);
        let mut callback = self.callback.lock().expect("sink lock poisoned");
        callback(&line);
    }

    fn flush(&self) {
        // The callback owns any downstream buffering.
    }

    fn description(&self) -> &str {
        &self.description
    }
}
