//! Scan and metadata-resolve stages.

use std::sync::Arc;

use medley_fsops::{Scanner, TargetKind, read_record, write_record};
use medley_metadata::{Catalog, MetadataError, MetadataRepository};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::job::{Job, JobHandler};

/// Walks a library root and emits one job per matched file.
///
/// A `TargetInfo` record is written beside every match so later stages never rescan.
/// A match whose record cannot be written is logged and skipped.
#[derive(Debug)]
pub struct ScanHandler {
    scanner: Scanner,
}

impl ScanHandler {
    /// Wrap a configured scanner.
    #[must_use]
    pub const fn new(scanner: Scanner) -> Self {
        Self { scanner }
    }
}

impl JobHandler for ScanHandler {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn handle(&self, job: &Job) -> PipelineResult<Vec<Job>> {
        let root = job.path()?;
        let targets = self
            .scanner
            .scan(&root)
            .map_err(|source| PipelineError::fsops("scan.walk", source))?;

        let mut jobs = Vec::with_capacity(targets.len());
        for target in targets {
            if let Err(error) = write_record(&target) {
                warn!(path = %target.path().display(), error = ?error, "target record not written; item skipped");
                continue;
            }
            jobs.push(
                Job::for_path(&target.path())
                    .with("kind", target.kind.to_string())
                    .with("id", target.id.clone()),
            );
        }
        info!(root = %root.display(), kind = %self.scanner.kind(), items = jobs.len(), "library scanned");
        Ok(jobs)
    }
}

/// Resolves metadata and artwork for a scanned item into the repository.
pub struct ResolveHandler {
    repository: Arc<MetadataRepository>,
    catalog: Arc<dyn Catalog>,
}

impl std::fmt::Debug for ResolveHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveHandler")
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl ResolveHandler {
    /// Resolve through `catalog` into `repository`.
    #[must_use]
    pub fn new(repository: Arc<MetadataRepository>, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            repository,
            catalog,
        }
    }
}

impl JobHandler for ResolveHandler {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn handle(&self, job: &Job) -> PipelineResult<Vec<Job>> {
        let path = job.path()?;
        let target =
            read_record(&path).map_err(|source| PipelineError::fsops("resolve.record", source))?;
        let wrap = |source: MetadataError| PipelineError::metadata("resolve.metadata", source);
        let catalog = self.catalog.as_ref();

        match target.kind {
            TargetKind::Movie => {
                let movie = self
                    .repository
                    .resolve_movie(&target.id, catalog)
                    .map_err(wrap)?;
                self.repository
                    .resolve_poster(&target.id, &movie.poster, catalog)
                    .map_err(wrap)?;
                info!(id = %target.id, title = %movie.title, "movie resolved");
            }
            TargetKind::Episode => {
                let series = self
                    .repository
                    .resolve_series(&target.id, catalog)
                    .map_err(wrap)?;
                self.repository
                    .resolve_poster(&target.id, &series.poster, catalog)
                    .map_err(wrap)?;
                if let (Some(season), Some(episode)) = (target.collection, target.item) {
                    let info = self
                        .repository
                        .resolve_episode(&target.id, season, episode, catalog)
                        .map_err(wrap)?;
                    info!(id = %target.id, season, episode, title = %info.title, "episode resolved");
                } else {
                    info!(id = %target.id, title = %series.title, "series resolved");
                }
            }
            TargetKind::Audio => {
                debug!(path = %path.display(), "audio item needs no catalog metadata");
            }
        }
        Ok(vec![job.clone()])
    }
}
