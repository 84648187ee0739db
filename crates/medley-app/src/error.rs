//! # Design
//!
//! - Centralize application-level errors for bootstrap and wiring.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: medley_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: medley_telemetry::TelemetryError,
    },
    /// Building a stage failed.
    #[error("pipeline wiring failed")]
    Pipeline {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: medley_pipeline::PipelineError,
    },
    /// Building a scanner failed.
    #[error("scanner wiring failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: medley_fsops::FsOpsError,
    },
    /// Opening the metadata repository failed.
    #[error("metadata repository wiring failed")]
    Metadata {
        /// Operation identifier.
        operation: &'static str,
        /// Source metadata error.
        source: medley_metadata::MetadataError,
    },
    /// Required dependency was missing.
    #[error("missing dependency")]
    MissingDependency {
        /// Name of the missing dependency.
        name: &'static str,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: medley_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: medley_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn pipeline(
        operation: &'static str,
        source: medley_pipeline::PipelineError,
    ) -> Self {
        Self::Pipeline { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: medley_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn metadata(
        operation: &'static str,
        source: medley_metadata::MetadataError,
    ) -> Self {
        Self::Metadata { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn app_error_helpers_build_variants() {
        let pipeline = AppError::pipeline(
            "rip.build",
            medley_pipeline::PipelineError::MissingDependency {
                component: "producer",
            },
        );
        assert!(matches!(pipeline, AppError::Pipeline { operation: "rip.build", .. }));
        assert!(pipeline.source().is_some());

        let config = AppError::config(
            "config.load",
            medley_config::ConfigError::InvalidField {
                section: "staging".to_string(),
                field: "root".to_string(),
                value: None,
                reason: "empty",
            },
        );
        assert!(matches!(config, AppError::Config { .. }));
        assert_eq!(config.to_string(), "configuration operation failed");
    }
}
