// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::{ProcrunError, Result};

/// Load a configuration file from a given path.
///
/// Performs TOML deserialization plus basic sanity validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;
    validate(&config)?;

    Ok(config)
}

/// Load the config at `path`, or fall back to defaults when the file does
/// not exist. A file that exists but fails to parse is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(ConfigFile::default());
    }
    load_from_path(path)
}

/// Helper to resolve the default config path (`Procrun.toml` in the
/// current working directory).
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Procrun.toml")
}

fn validate(config: &ConfigFile) -> Result<()> {
    if config.engine.drain_wait_ms == 0 {
        return Err(ProcrunError::ConfigError(
            "engine.drain_wait_ms must be positive".to_string(),
        ));
    }
    if config.engine.ps_timeout_ms == 0 {
        return Err(ProcrunError::ConfigError(
            "engine.ps_timeout_ms must be positive".to_string(),
        ));
    }
    Ok(())
}
