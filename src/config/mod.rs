// src/config/mod.rs

//! Optional `Procrun.toml` configuration for the CLI and engine defaults.

pub mod loader;
pub mod model;

pub use loader::{default_config_path, load_from_path, load_or_default};
pub use model::{ConfigFile, DefaultsSection, EngineSection};
