//! Deterministic output locations for produced artifacts.

use std::path::{Path, PathBuf};

use medley_fsops::{TargetInfo, TargetKind};

use crate::error::{PipelineError, PipelineResult};

/// Maps a target to `{root}/{kind}/{id}[.{season}.{episode}].{format}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
    format: String,
}

impl ArtifactLayout {
    /// Layout rooted at `root` producing files with extension `format`.
    ///
    /// A leading dot on `format` is ignored and the extension is lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when the root or the format is empty.
    pub fn new(root: impl Into<PathBuf>, format: &str) -> PipelineResult<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(PipelineError::InvalidConfig {
                field: "output_root",
                reason: "empty",
                value: None,
            });
        }
        let format = format.trim().trim_start_matches('.').to_ascii_lowercase();
        if format.is_empty() {
            return Err(PipelineError::InvalidConfig {
                field: "format",
                reason: "empty",
                value: None,
            });
        }
        Ok(Self { root, format })
    }

    /// Output root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target extension, lowercase and without a dot.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Whether `path` already carries the target extension.
    #[must_use]
    pub fn matches_format(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.format))
    }

    /// Output path for `target`.
    #[must_use]
    pub fn output_path(&self, target: &TargetInfo) -> PathBuf {
        let file_name = match (target.kind, target.collection, target.item) {
            (TargetKind::Episode, Some(season), Some(episode)) => {
                format!("{}.{season}.{episode}.{}", target.id, self.format)
            }
            _ => format!("{}.{}", target.id, self.format),
        };
        self.root.join(target.kind.dir_name()).join(file_name)
    }
}
