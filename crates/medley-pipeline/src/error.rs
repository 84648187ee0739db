//! # Design
//!
//! - Constant messages; programs, paths, and parameters travel in fields.
//! - Filesystem and metadata failures are wrapped with the pipeline operation that hit them.
//! - Tool failures keep the exit status and captured stderr for the caller to report.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use medley_fsops::FsOpsError;
use medley_metadata::MetadataError;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised by stage handlers, producers, and external tools.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required collaborator was not supplied at construction time.
    #[error("pipeline dependency missing")]
    MissingDependency {
        /// Component that was not configured.
        component: &'static str,
    },
    /// Construction-time configuration was unusable.
    #[error("pipeline invalid configuration")]
    InvalidConfig {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value, when one exists.
        value: Option<String>,
    },
    /// A job lacked a required parameter.
    #[error("job parameter missing")]
    MissingParam {
        /// Name of the missing parameter.
        param: &'static str,
    },
    /// An input expected by a stage does not exist.
    #[error("pipeline input not found")]
    NotFound {
        /// Operation that looked for the input.
        operation: &'static str,
        /// Path that was checked.
        path: PathBuf,
    },
    /// An external tool could not be started.
    #[error("external tool spawn failed")]
    ToolSpawn {
        /// Program that was executed.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An external tool exited unsuccessfully.
    #[error("external tool failed")]
    ToolFailed {
        /// Program that was executed.
        program: String,
        /// Exit code, absent when the process was terminated by a signal.
        status: Option<i32>,
        /// Captured standard error, empty when output was discarded.
        stderr: String,
    },
    /// An external tool exceeded its time budget and was killed.
    #[error("external tool timed out")]
    ToolTimeout {
        /// Program that was executed.
        program: String,
        /// Time budget that elapsed.
        timeout: Duration,
    },
    /// External tool output could not be decoded.
    #[error("external tool output invalid")]
    ToolOutput {
        /// Program that produced the output.
        program: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// IO failures outside the staging layer.
    #[error("pipeline io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Staging, scanning, or record persistence failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: FsOpsError,
    },
    /// Metadata resolution failed.
    #[error("metadata operation failed")]
    Metadata {
        /// Operation identifier.
        operation: &'static str,
        /// Source metadata error.
        source: MetadataError,
    },
}

impl PipelineError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn fsops(operation: &'static str, source: FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn metadata(operation: &'static str, source: MetadataError) -> Self {
        Self::Metadata { operation, source }
    }

    /// Whether the error reports a missing input.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::FsOps { source, .. } => source.is_not_found(),
            Self::Metadata { source, .. } => matches!(source, MetadataError::NotFound { .. }),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn wrapped_errors_keep_their_source() {
        let fs_err = PipelineError::fsops(
            "rip.evacuate",
            FsOpsError::NotFound {
                operation: "evacuate.of",
                path: PathBuf::from("missing.mkv"),
            },
        );
        assert!(fs_err.source().is_some());
        assert!(fs_err.is_not_found());

        let io_err = PipelineError::io("copy", "a.mkv", io::Error::other("disk full"));
        assert!(io_err.source().is_some());
        assert!(!io_err.is_not_found());
    }

    #[test]
    fn tool_errors_carry_context() {
        let err = PipelineError::ToolFailed {
            program: "encoder".to_string(),
            status: Some(3),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "external tool failed");
        assert!(matches!(
            err,
            PipelineError::ToolFailed {
                status: Some(3),
                ..
            }
        ));
    }
}
