// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::merge::resolve_str;
use crate::config::model::Configuration;
use crate::errors::Result;

/// Load a configuration file and resolve it over the built-in defaults.
///
/// A missing file is not an error: the defaults describe a complete project
/// layout, so an absent config file simply means "all defaults".
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Configuration> {
    let path = path.as_ref();

    if !path.exists() {
        debug!(?path, "config file not found; using defaults");
        return resolve_str("");
    }

    let contents = fs::read_to_string(path)?;
    resolve_str(&contents)
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Devrig.toml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `DEVRIG_CONFIG`).
/// - Support project-local config discovery.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Devrig.toml")
}
