//! # Design
//!
//! - Constant messages; context (kind, id, path, field) travels in fields.
//! - Catalog failures are carried as their original boxed error so callers see them unchanged.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;

/// Result alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while resolving or reading cached metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// IO failures while reading cache entries.
    #[error("metadata io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Cache entry could not be serialised or deserialised.
    #[error("metadata json failure")]
    Json {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Persisting a cache entry failed.
    #[error("metadata persistence failed")]
    Persist {
        /// Cache entry being written.
        path: PathBuf,
        /// Underlying filesystem error.
        source: medley_fsops::FsOpsError,
    },
    /// The catalog returned an error for a fetch.
    #[error("catalog fetch failed")]
    Fetch {
        /// Kind of artifact being fetched.
        kind: &'static str,
        /// Identifier or URL that was requested.
        key: String,
        /// Error reported by the catalog.
        source: CatalogError,
    },
    /// Catalog payload lacked a field required by the record variant.
    #[error("catalog payload incomplete")]
    IncompletePayload {
        /// Record variant being mapped.
        kind: &'static str,
        /// Identifier of the record.
        id: String,
        /// Missing or mistyped field.
        field: &'static str,
    },
    /// Catalog returned an empty image.
    #[error("catalog returned an empty image")]
    EmptyImage {
        /// Identifier owning the image.
        id: String,
        /// Image reference that was fetched.
        url: String,
    },
    /// Identifier cannot be used to build a cache path.
    #[error("invalid identity")]
    InvalidIdentity {
        /// Static reason for the rejection.
        reason: &'static str,
        /// Offending identifier.
        id: String,
    },
    /// Configuration supplied at construction time was unusable.
    #[error("metadata invalid configuration")]
    InvalidConfig {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// A cache entry expected to exist was absent.
    #[error("metadata cache entry not found")]
    NotFound {
        /// Kind of artifact looked up.
        kind: &'static str,
        /// Path that was checked.
        path: PathBuf,
    },
}

impl MetadataError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn fetch(kind: &'static str, key: impl Into<String>, source: CatalogError) -> Self {
        Self::Fetch {
            kind,
            key: key.into(),
            source,
        }
    }

    pub(crate) fn incomplete(kind: &'static str, id: &str, field: &'static str) -> Self {
        Self::IncompletePayload {
            kind,
            id: id.to_string(),
            field,
        }
    }
}
