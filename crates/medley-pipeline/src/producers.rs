//! Rip and tag producers backed by external tools.
//!
//! Both stage a copy of their input, let the tool work inside the private
//! staging directory, and commit with a single rename. Any failure drops the
//! evacuation, which discards the directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use medley_fsops::{TargetInfo, TargetKind};
use medley_metadata::{MetadataError, MetadataRepository};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::processor::Producer;
use crate::staging::StagingArea;
use crate::tool::{ExternalTool, ToolVars};

/// Placeholders every producer supplies: identity plus input and output paths.
fn base_vars(target: &TargetInfo, input: &Path, output: &Path) -> ToolVars {
    ToolVars::from([
        ("input", input.display().to_string()),
        ("output", output.display().to_string()),
        ("id", target.id.clone()),
        (
            "season",
            target.collection.map(|n| n.to_string()).unwrap_or_default(),
        ),
        (
            "episode",
            target.item.map(|n| n.to_string()).unwrap_or_default(),
        ),
    ])
}

/// Re-encodes a staged copy of the input with the configured encoder.
#[derive(Debug)]
pub struct RipProducer {
    tool: ExternalTool,
    staging: StagingArea,
    format: String,
}

impl RipProducer {
    /// Encoder producing files with extension `format`.
    #[must_use]
    pub fn new(tool: ExternalTool, staging: StagingArea, format: &str) -> Self {
        Self {
            tool,
            staging,
            format: format.trim_start_matches('.').to_string(),
        }
    }
}

impl Producer for RipProducer {
    fn name(&self) -> &'static str {
        "rip"
    }

    fn produce(&self, target: &TargetInfo, input: &Path, output: &Path) -> PipelineResult<()> {
        let staged = self.staging.stage_copy("rip.evacuate", input)?;
        let encoded = staged.sibling(&format!(".encoded.{}", self.format));

        let mut vars = base_vars(target, staged.path(), &encoded);
        vars.insert("title", target.stem().to_string());
        self.tool.run(&vars, &[])?;

        if !encoded.is_file() {
            return Err(PipelineError::NotFound {
                operation: "rip.encoded",
                path: encoded,
            });
        }
        fs::rename(&encoded, staged.path())
            .map_err(|source| PipelineError::io("rip.replace", staged.path(), source))?;
        debug!(id = %target.id, staged = %staged.path().display(), "encoded copy staged");

        staged
            .move_to(output)
            .map_err(|source| PipelineError::fsops("rip.commit", source))?;
        Ok(())
    }
}

/// Writes metadata and artwork into a staged copy of the input.
#[derive(Debug)]
pub struct TagProducer {
    tool: ExternalTool,
    staging: StagingArea,
    repository: Arc<MetadataRepository>,
}

impl TagProducer {
    /// Tagger reading metadata from `repository`.
    #[must_use]
    pub const fn new(
        tool: ExternalTool,
        staging: StagingArea,
        repository: Arc<MetadataRepository>,
    ) -> Self {
        Self {
            tool,
            staging,
            repository,
        }
    }

    /// Title, year, and poster placeholders for `target` from cached metadata.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Metadata`] when a required record was never resolved.
    pub fn tag_vars(&self, target: &TargetInfo) -> PipelineResult<ToolVars> {
        let wrap = |source: MetadataError| PipelineError::metadata("tag.metadata", source);
        let mut vars = ToolVars::new();
        match target.kind {
            TargetKind::Movie => {
                let movie = self.repository.cached_movie(&target.id).map_err(wrap)?;
                vars.insert("title", movie.title);
                vars.insert("year", movie.year);
            }
            TargetKind::Episode => {
                let series = self.repository.cached_series(&target.id).map_err(wrap)?;
                let (title, year) = match (target.collection, target.item) {
                    (Some(season), Some(episode)) => {
                        let info = self
                            .repository
                            .cached_episode(&target.id, season, episode)
                            .map_err(wrap)?;
                        (info.title, info.year.unwrap_or_else(|| series.year.clone()))
                    }
                    _ => (series.title.clone(), series.year.clone()),
                };
                vars.insert("title", title);
                vars.insert("year", year);
                vars.insert("series", series.title);
            }
            TargetKind::Audio => {
                vars.insert("title", target.stem().to_string());
                vars.insert("year", String::new());
            }
        }
        let poster = match target.kind {
            TargetKind::Audio => None,
            TargetKind::Movie | TargetKind::Episode => {
                self.repository.cached_poster(&target.id).map_err(wrap)?
            }
        };
        vars.insert(
            "poster",
            poster.map(|p| p.display().to_string()).unwrap_or_default(),
        );
        Ok(vars)
    }
}

impl Producer for TagProducer {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn produce(&self, target: &TargetInfo, input: &Path, output: &Path) -> PipelineResult<()> {
        let tags = self.tag_vars(target)?;
        let staged = self.staging.stage_copy("tag.evacuate", input)?;

        let mut vars = base_vars(target, staged.path(), staged.path());
        vars.extend(tags);
        self.tool.run(&vars, &[])?;

        staged
            .move_to(output)
            .map_err(|source| PipelineError::fsops("tag.commit", source))?;
        Ok(())
    }
}
