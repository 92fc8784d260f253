#![allow(dead_code)]

use std::sync::Arc;

use procrun::exec::{ExecutionRequest, ExecutionSinks};
use procrun::sink::MemorySink;

/// Request that runs a small shell script: `sh -c <script>`.
///
/// All process tests build their children this way so the scripts stay
/// readable in the test body.
pub fn sh(script: &str) -> ExecutionRequest {
    ExecutionRequest::new("sh").with_args(["-c", script])
}

/// Memory-backed sink set, returning the handles for later inspection
/// alongside the `ExecutionSinks` to pass to the engine.
pub struct MemorySinks {
    pub stdout: Arc<MemorySink>,
    pub stderr: Arc<MemorySink>,
    pub diagnostic: Arc<MemorySink>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self {
            stdout: Arc::new(MemorySink::new("stdout")),
            stderr: Arc::new(MemorySink::new("stderr")),
            diagnostic: Arc::new(MemorySink::new("diagnostic")),
        }
    }

    /// The engine-facing view of these sinks.
    pub fn sinks(&self) -> ExecutionSinks {
        ExecutionSinks::new(self.stdout.clone(), self.stderr.clone())
            .with_diagnostic(self.diagnostic.clone())
    }
}

impl Default for MemorySinks {
    fn default() -> Self {
        Self::new()
    }
}
