// src/config/model.rs

//! Data model for `Procrun.toml`.
//!
//! All fields are optional with sensible defaults, so an empty (or absent)
//! file is a valid configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::exec::EngineConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// `[engine]` section: tuning knobs for the execution engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Bounded post-resolution drain wait, in milliseconds.
    #[serde(default = "default_drain_wait_ms")]
    pub drain_wait_ms: u64,
    /// Bound on process-table queries, in milliseconds.
    #[serde(default = "default_ps_timeout_ms")]
    pub ps_timeout_ms: u64,
    /// Bound on each debugger backtrace attempt, in seconds.
    #[serde(default = "default_debugger_timeout_secs")]
    pub debugger_timeout_secs: u64,
    /// Capture kill diagnostics when a timeout triggers a tree kill.
    #[serde(default)]
    pub kill_diagnostics: bool,
}

/// `[defaults]` section: per-run defaults the CLI applies when flags are
/// not given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsSection {
    /// Default wall-clock timeout, in seconds. Absent means unbounded.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Prefix sink lines with timestamps.
    #[serde(default)]
    pub timestamps: bool,
}

fn default_drain_wait_ms() -> u64 {
    1000
}

fn default_ps_timeout_ms() -> u64 {
    1000
}

fn default_debugger_timeout_secs() -> u64 {
    30
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            drain_wait_ms: default_drain_wait_ms(),
            ps_timeout_ms: default_ps_timeout_ms(),
            debugger_timeout_secs: default_debugger_timeout_secs(),
            kill_diagnostics: false,
        }
    }
}

impl EngineSection {
    /// Translate into the engine's own config struct.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            drain_wait: Duration::from_millis(self.drain_wait_ms),
            diagnostics_on_timeout: self.kill_diagnostics,
            ps_timeout: Duration::from_millis(self.ps_timeout_ms),
            debugger_timeout: Duration::from_secs(self.debugger_timeout_secs),
        }
    }
}
