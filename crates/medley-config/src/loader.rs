//! Loading the configuration document from disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::defaults::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
use crate::error::{ConfigError, ConfigResult};
use crate::model::MedleyConfig;

/// Configuration path from `MEDLEY_CONFIG`, falling back to `medley.json`.
#[must_use]
pub fn config_path_from_env() -> PathBuf {
    config_path_from(std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
}

fn config_path_from(value: Option<PathBuf>) -> PathBuf {
    value
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read, parse, and validate the configuration at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, [`ConfigError::Parse`]
/// when it does not match the model, and [`ConfigError::InvalidField`] when a
/// value fails validation.
pub fn load_config(path: &Path) -> ConfigResult<MedleyConfig> {
    let raw = fs::read(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    let config: MedleyConfig = serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    info!(
        path = %path.display(),
        libraries = config.libraries.len(),
        lazy = config.lazy,
        "configuration loaded"
    );
    Ok(config)
}
