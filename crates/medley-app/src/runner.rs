//! Stage wiring and the sequential one-shot run.
//!
//! # Design
//! - Every library is scanned, then each discovered item runs resolve, rip, and
//!   tag in order. A failing item stops only its own chain.
//! - Audio libraries skip catalog resolution, so a catalog is only required when
//!   a movie or series library is configured.

use std::path::PathBuf;
use std::sync::Arc;

use medley_config::{LibraryConfig, LibraryKind, MedleyConfig};
use medley_fsops::{PathMatcher, Scanner};
use medley_metadata::{Catalog, MetadataRepository};
use medley_pipeline::{
    ArtifactLayout, ArtifactProcessor, CommandCatalog, ExternalTool, Job, JobHandler,
    PipelineResult, ResolveHandler, RipProducer, ScanHandler, StagingArea, TagProducer,
};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Counts reported after a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items discovered by the scanners.
    pub scanned: usize,
    /// Items that completed every stage.
    pub completed: usize,
    /// Items or libraries that failed.
    pub failed: usize,
}

struct Library {
    name: String,
    root: PathBuf,
    scan: ScanHandler,
}

/// Handlers for every stage, built from configuration.
pub struct Pipeline {
    libraries: Vec<Library>,
    resolve: Option<ResolveHandler>,
    rip: ArtifactProcessor,
    tag: ArtifactProcessor,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("libraries", &self.libraries.len())
            .field("resolve", &self.resolve.is_some())
            .field("rip", &self.rip)
            .field("tag", &self.tag)
            .finish()
    }
}

impl Pipeline {
    /// Wire handlers using the command catalog named in `config`, if any.
    ///
    /// # Errors
    ///
    /// Returns a wiring error for unusable tool, layout, or scanner settings.
    pub fn from_config(config: &MedleyConfig) -> AppResult<Self> {
        let catalog = match &config.catalog {
            Some(tool) => {
                let tool = ExternalTool::new(
                    tool.program.clone(),
                    tool.args.clone(),
                    tool.timeout(),
                    true,
                )
                .map_err(|err| AppError::pipeline("catalog.build", err))?;
                Some(Arc::new(CommandCatalog::new(tool)) as Arc<dyn Catalog>)
            }
            None => None,
        };
        Self::with_catalog(config, catalog)
    }

    /// Wire handlers around an explicit catalog.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingDependency`] when a movie or series library is
    /// configured without a catalog, or a wiring error for unusable settings.
    pub fn with_catalog(
        config: &MedleyConfig,
        catalog: Option<Arc<dyn Catalog>>,
    ) -> AppResult<Self> {
        let needs_catalog = config
            .libraries
            .iter()
            .any(|library| library.kind != LibraryKind::Audio);
        if needs_catalog && catalog.is_none() {
            return Err(AppError::MissingDependency { name: "catalog" });
        }

        let repository = Arc::new(
            MetadataRepository::new(&config.repository.root, config.lazy)
                .map_err(|err| AppError::metadata("repository.open", err))?,
        );
        let staging = StagingArea::new(&config.staging.root, config.staging.char_replacements());

        let libraries = config
            .libraries
            .iter()
            .map(|library| build_library(config, library))
            .collect::<AppResult<Vec<_>>>()?;
        let resolve = catalog.map(|catalog| ResolveHandler::new(Arc::clone(&repository), catalog));

        let rip_layout = ArtifactLayout::new(&config.output.rip_root, &config.rip.format)
            .map_err(|err| AppError::pipeline("rip.layout", err))?;
        let rip_tool = tool(&config.rip.tool).map_err(|err| AppError::pipeline("rip.tool", err))?;
        let rip = ArtifactProcessor::builder("rip")
            .producer(Arc::new(RipProducer::new(
                rip_tool,
                staging.clone(),
                &config.rip.format,
            )))
            .output(rip_layout.clone())
            .accept(&config.rip.accept)
            .staging(staging.clone())
            .lazy(config.lazy)
            .copy_when_in_format(true)
            .build()
            .map_err(|err| AppError::pipeline("rip.build", err))?;

        let tag_layout = ArtifactLayout::new(&config.output.tag_root, &config.tag.format)
            .map_err(|err| AppError::pipeline("tag.layout", err))?;
        let tag_tool = tool(&config.tag.tool).map_err(|err| AppError::pipeline("tag.tool", err))?;
        let tag = ArtifactProcessor::builder("tag")
            .producer(Arc::new(TagProducer::new(
                tag_tool,
                staging.clone(),
                repository,
            )))
            .output(tag_layout)
            .intermediate(rip_layout)
            .accept(&config.tag.accept)
            .staging(staging)
            .lazy(config.lazy)
            .build()
            .map_err(|err| AppError::pipeline("tag.build", err))?;

        Ok(Self {
            libraries,
            resolve,
            rip,
            tag,
        })
    }

    /// Run every stage over every library once.
    #[must_use]
    pub fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for library in &self.libraries {
            let jobs = match library.scan.handle(&Job::for_path(&library.root)) {
                Ok(jobs) => jobs,
                Err(error) => {
                    warn!(library = %library.name, error = ?error, "library scan failed");
                    summary.failed += 1;
                    continue;
                }
            };
            summary.scanned += jobs.len();
            for job in jobs {
                match self.process_item(&job) {
                    Ok(()) => summary.completed += 1,
                    Err(error) => {
                        warn!(
                            library = %library.name,
                            path = job.get(medley_pipeline::PATH_PARAM).unwrap_or_default(),
                            error = ?error,
                            "item failed"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }
        info!(
            scanned = summary.scanned,
            completed = summary.completed,
            failed = summary.failed,
            "pipeline run finished"
        );
        summary
    }

    fn process_item(&self, job: &Job) -> PipelineResult<()> {
        let resolved = match &self.resolve {
            Some(resolve) => resolve.handle(job)?,
            None => vec![job.clone()],
        };
        for job in resolved {
            for job in self.rip.handle(&job)? {
                self.tag.handle(&job)?;
            }
        }
        Ok(())
    }
}

fn build_library(config: &MedleyConfig, library: &LibraryConfig) -> AppResult<Library> {
    let matcher = PathMatcher::compile(&library.templates, &config.patterns.sub_patterns())
        .map_err(|err| AppError::fsops("scanner.templates", err))?;
    let scanner = Scanner::new(
        library.kind.target_kind(),
        matcher,
        library.exclude_dirs.clone(),
        &library.media_globs,
    )
    .map_err(|err| AppError::fsops("scanner.globs", err))?;
    Ok(Library {
        name: library.name.clone(),
        root: library.root.clone(),
        scan: ScanHandler::new(scanner),
    })
}

fn tool(config: &medley_config::ToolConfig) -> PipelineResult<ExternalTool> {
    ExternalTool::new(
        config.program.clone(),
        config.args.clone(),
        config.timeout(),
        config.capture_output,
    )
}
