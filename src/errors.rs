// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcrunError {
    /// The program could not be started at all (missing binary, not
    /// executable). Distinct from "the program ran and returned nonzero".
    #[error("failed to launch '{program}': {source}")]
    LaunchFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProcrunError {
    /// True when the error means the executable itself could not be started.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, ProcrunError::LaunchFailure { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcrunError>;
