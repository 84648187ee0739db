//! Staging settings shared by every stage that mutates files.

use std::path::{Path, PathBuf};

use medley_fsops::{CharReplacements, EvacuationStrategy, Evacuation, Evacuator};

use crate::error::{PipelineError, PipelineResult};

/// Where and how files are evacuated before risky work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingArea {
    root: PathBuf,
    replacements: CharReplacements,
}

impl StagingArea {
    /// Staging under `root` with file names rewritten by `replacements`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, replacements: CharReplacements) -> Self {
        Self {
            root: root.into(),
            replacements,
        }
    }

    /// Staging root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stage `input` by copy in a fresh private directory.
    ///
    /// # Errors
    ///
    /// Returns the staging failure wrapped with `operation`.
    pub fn stage_copy(&self, operation: &'static str, input: &Path) -> PipelineResult<Evacuation> {
        Evacuator::prepare(&self.root, self.replacements.clone())
            .and_then(|evacuator| evacuator.of(input)?.by(EvacuationStrategy::Copy))
            .map_err(|source| PipelineError::fsops(operation, source))
    }
}
