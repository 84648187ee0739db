//! Default values for optional configuration fields.
//!
//! # Design
//! - Keep defaults in one place so the model, loader, and docs agree.

use std::collections::BTreeMap;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "MEDLEY_CONFIG";
/// Configuration file used when the environment variable is unset.
pub const DEFAULT_CONFIG_PATH: &str = "medley.json";
/// Default external tool time budget in seconds.
pub(crate) const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 3_600;
/// Default log level.
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// Characters replaced in staged file names unless configured otherwise.
const UNSAFE_NAME_CHARS: [char; 8] = [':', '?', '*', '"', '<', '>', '|', '\\'];

pub(crate) const fn lazy() -> bool {
    true
}

pub(crate) const fn tool_timeout_secs() -> u64 {
    DEFAULT_TOOL_TIMEOUT_SECS
}

pub(crate) fn log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

pub(crate) fn replacements() -> BTreeMap<String, String> {
    UNSAFE_NAME_CHARS
        .iter()
        .map(|ch| (ch.to_string(), "_".to_string()))
        .collect()
}
