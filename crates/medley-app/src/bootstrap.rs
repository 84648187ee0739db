//! Process bootstrap: configuration lookup, logging installation, and the one-shot run.

use std::path::PathBuf;

use medley_config::{MedleyConfig, config_path_from_env, load_config};
use medley_telemetry::{LogFormat, LoggingConfig};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::runner::{Pipeline, RunSummary};

/// Build identifier recorded in logs.
const BUILD_ID: &str = env!("CARGO_PKG_VERSION");

/// Dependencies required to run the application once.
pub(crate) struct BootstrapDependencies {
    config_path: PathBuf,
    config: MedleyConfig,
}

impl BootstrapDependencies {
    /// Load configuration from the path named by the environment.
    pub(crate) fn from_env() -> AppResult<Self> {
        let config_path = config_path_from_env();
        let config =
            load_config(&config_path).map_err(|err| AppError::config("config.load", err))?;
        Ok(Self {
            config_path,
            config,
        })
    }
}

/// Entry point for one pipeline run.
///
/// # Errors
///
/// Returns an error if configuration, logging, or stage wiring fails. Per-item
/// failures are logged and counted in the summary instead.
pub fn run_app() -> AppResult<RunSummary> {
    let dependencies = BootstrapDependencies::from_env()?;
    run_app_with(&dependencies)
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) fn run_app_with(dependencies: &BootstrapDependencies) -> AppResult<RunSummary> {
    let settings = &dependencies.config.logging;
    let logging = LoggingConfig {
        level: &settings.level,
        format: LogFormat::from_name(settings.log_format.as_deref()),
        build_sha: BUILD_ID,
    };
    medley_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(
        config = %dependencies.config_path.display(),
        build = medley_telemetry::build_sha(),
        "medley run starting"
    );
    let pipeline = Pipeline::from_config(&dependencies.config)?;
    Ok(pipeline.run())
}
