//! Shared skeleton of the rip and tag stages.
//!
//! # Design
//! - Input preference: an intermediate artifact from an earlier stage wins; the
//!   original source is used only when its extension is in the accepted set.
//! - Lazy mode reuses an existing output. A stage that opts in also copies an
//!   input already in the target format instead of invoking the producer; a stage
//!   whose producer changes content without changing format must not opt in.
//! - Producers are injected at construction; a processor without one cannot be built.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use medley_fsops::{TargetInfo, read_record};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::job::{Job, JobHandler};
use crate::layout::ArtifactLayout;
use crate::staging::StagingArea;

/// Produces one artifact from an input file.
pub trait Producer: Send + Sync {
    /// Producer name used in logs.
    fn name(&self) -> &'static str;

    /// Write the artifact for `target` to `output`, reading from `input`.
    ///
    /// Implementations stage their work so that a failure leaves `output` untouched.
    ///
    /// # Errors
    ///
    /// Returns the tool, staging, or metadata failure that aborted the item.
    fn produce(&self, target: &TargetInfo, input: &Path, output: &Path) -> PipelineResult<()>;
}

/// Outcome of processing one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Processed {
    /// An existing output was reused.
    Reused(PathBuf),
    /// The input was already in the target format and was copied.
    Copied(PathBuf),
    /// The producer wrote a new output.
    Produced(PathBuf),
}

impl Processed {
    /// Output location regardless of how it was obtained.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Reused(path) | Self::Copied(path) | Self::Produced(path) => path,
        }
    }
}

/// Builder for [`ArtifactProcessor`].
#[derive(Default)]
pub struct ArtifactProcessorBuilder {
    stage: &'static str,
    producer: Option<Arc<dyn Producer>>,
    output: Option<ArtifactLayout>,
    intermediate: Option<ArtifactLayout>,
    accept: Vec<String>,
    staging: Option<StagingArea>,
    lazy: bool,
    copy_in_format: bool,
}

impl ArtifactProcessorBuilder {
    /// Producer invoked when the output must be recomputed.
    #[must_use]
    pub fn producer(mut self, producer: Arc<dyn Producer>) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Layout of the artifacts this stage writes.
    #[must_use]
    pub fn output(mut self, layout: ArtifactLayout) -> Self {
        self.output = Some(layout);
        self
    }

    /// Layout of an earlier stage's artifacts, preferred as input.
    #[must_use]
    pub fn intermediate(mut self, layout: ArtifactLayout) -> Self {
        self.intermediate = Some(layout);
        self
    }

    /// Extensions under which the original source may be used directly.
    #[must_use]
    pub fn accept<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.accept = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Staging area used for lazy copies.
    #[must_use]
    pub fn staging(mut self, staging: StagingArea) -> Self {
        self.staging = Some(staging);
        self
    }

    /// Enable reuse of existing outputs.
    #[must_use]
    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// In lazy mode, copy an input already in the target format instead of producing.
    #[must_use]
    pub const fn copy_when_in_format(mut self, enabled: bool) -> Self {
        self.copy_in_format = enabled;
        self
    }

    /// Finish construction.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingDependency`] when the producer, the output
    /// layout, or the staging area was not supplied.
    pub fn build(self) -> PipelineResult<ArtifactProcessor> {
        let producer = self.producer.ok_or(PipelineError::MissingDependency {
            component: "producer",
        })?;
        let output = self.output.ok_or(PipelineError::MissingDependency {
            component: "output_layout",
        })?;
        let staging = self.staging.ok_or(PipelineError::MissingDependency {
            component: "staging",
        })?;
        Ok(ArtifactProcessor {
            stage: self.stage,
            producer,
            output,
            intermediate: self.intermediate,
            accept: self.accept,
            staging,
            lazy: self.lazy,
            copy_in_format: self.copy_in_format,
        })
    }
}

/// Job handler that turns a scanned item into an artifact at a deterministic path.
pub struct ArtifactProcessor {
    stage: &'static str,
    producer: Arc<dyn Producer>,
    output: ArtifactLayout,
    intermediate: Option<ArtifactLayout>,
    accept: Vec<String>,
    staging: StagingArea,
    lazy: bool,
    copy_in_format: bool,
}

impl std::fmt::Debug for ArtifactProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactProcessor")
            .field("stage", &self.stage)
            .field("producer", &self.producer.name())
            .field("output", &self.output)
            .field("intermediate", &self.intermediate)
            .field("accept", &self.accept)
            .field("lazy", &self.lazy)
            .field("copy_in_format", &self.copy_in_format)
            .finish_non_exhaustive()
    }
}

impl ArtifactProcessor {
    /// Start building a processor for the stage called `stage`.
    #[must_use]
    pub fn builder(stage: &'static str) -> ArtifactProcessorBuilder {
        ArtifactProcessorBuilder {
            stage,
            ..ArtifactProcessorBuilder::default()
        }
    }

    /// Layout of this stage's outputs.
    #[must_use]
    pub const fn output_layout(&self) -> &ArtifactLayout {
        &self.output
    }

    /// Input file for `target`: the intermediate artifact when present, else an
    /// accepted original.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFound`] when neither is usable.
    pub fn resolve_input(&self, target: &TargetInfo) -> PipelineResult<PathBuf> {
        if let Some(layout) = &self.intermediate {
            let candidate = layout.output_path(target);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        let original = target.path();
        let accepted = self.accept.is_empty()
            || target
                .extension()
                .is_some_and(|ext| self.accept.iter().any(|allowed| *allowed == ext));
        if accepted && original.is_file() {
            return Ok(original);
        }
        Err(PipelineError::NotFound {
            operation: self.stage,
            path: original,
        })
    }

    /// Produce, copy, or reuse the artifact for `target`.
    ///
    /// # Errors
    ///
    /// Returns input resolution, staging, or producer failures.
    pub fn process(&self, target: &TargetInfo) -> PipelineResult<Processed> {
        let output = self.output.output_path(target);
        if self.lazy && output.is_file() {
            debug!(stage = self.stage, output = %output.display(), "output reused");
            return Ok(Processed::Reused(output));
        }

        let input = self.resolve_input(target)?;
        if self.lazy && self.copy_in_format && self.output.matches_format(&input) {
            let staged = self.staging.stage_copy("processor.copy", &input)?;
            let output = staged
                .move_to(&output)
                .map_err(|source| PipelineError::fsops("processor.copy", source))?;
            info!(stage = self.stage, input = %input.display(), output = %output.display(), "input copied");
            return Ok(Processed::Copied(output));
        }

        self.producer.produce(target, &input, &output)?;
        info!(
            stage = self.stage,
            producer = self.producer.name(),
            id = %target.id,
            output = %output.display(),
            "artifact produced"
        );
        Ok(Processed::Produced(output))
    }
}

impl JobHandler for ArtifactProcessor {
    fn name(&self) -> &'static str {
        self.stage
    }

    fn handle(&self, job: &Job) -> PipelineResult<Vec<Job>> {
        let path = job.path()?;
        let target =
            read_record(&path).map_err(|source| PipelineError::fsops("processor.record", source))?;
        let processed = self.process(&target)?;
        Ok(vec![
            job.clone()
                .with(self.stage, processed.path().display().to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use medley_fsops::{CharReplacements, Identity, TargetKind, write_record};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingProducer {
        calls: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl Producer for CountingProducer {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn produce(&self, _target: &TargetInfo, input: &Path, output: &Path) -> PipelineResult<()> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(input.to_path_buf());
            }
            if self.fail {
                return Err(PipelineError::ToolFailed {
                    program: "counting".to_string(),
                    status: Some(1),
                    stderr: String::new(),
                });
            }
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent).map_err(|e| PipelineError::io("test", parent, e))?;
            }
            fs::write(output, b"produced").map_err(|e| PipelineError::io("test", output, e))
        }
    }

    impl CountingProducer {
        fn calls(&self) -> usize {
            self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
        }
    }

    struct Fixture {
        temp: TempDir,
        target: TargetInfo,
    }

    fn fixture(file_name: &str) -> Result<Fixture> {
        let temp = TempDir::new()?;
        let source = temp.path().join("library").join(file_name);
        fs::create_dir_all(source.parent().unwrap_or(temp.path()))?;
        fs::write(&source, b"source")?;
        let target = TargetInfo::from_identity(
            &source,
            TargetKind::Movie,
            Identity {
                id: "tt1".to_string(),
                collection: None,
                item: None,
            },
        )
        .ok_or_else(|| anyhow::anyhow!("fixture target"))?;
        write_record(&target)?;
        Ok(Fixture { temp, target })
    }

    fn processor(
        fixture: &Fixture,
        producer: Arc<CountingProducer>,
        lazy: bool,
    ) -> Result<ArtifactProcessor> {
        Ok(ArtifactProcessor::builder("rip")
            .producer(producer)
            .output(ArtifactLayout::new(fixture.temp.path().join("out"), "mkv")?)
            .accept(["avi", ".MKV"])
            .staging(StagingArea::new(
                fixture.temp.path().join("stage"),
                CharReplacements::filesystem_safe(),
            ))
            .lazy(lazy)
            .copy_when_in_format(true)
            .build()?)
    }

    #[test]
    fn missing_producer_is_a_construction_error() {
        let err = ArtifactProcessor::builder("rip").build().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingDependency {
                component: "producer"
            }
        ));
    }

    #[test]
    fn producer_runs_when_output_is_absent() -> Result<()> {
        let fixture = fixture("movie.avi")?;
        let producer = Arc::new(CountingProducer::default());
        let processor = processor(&fixture, Arc::clone(&producer), true)?;

        let processed = processor.process(&fixture.target)?;
        assert_eq!(
            processed,
            Processed::Produced(fixture.temp.path().join("out/movies/tt1.mkv"))
        );
        assert_eq!(producer.calls(), 1);

        let again = processor.process(&fixture.target)?;
        assert!(matches!(again, Processed::Reused(_)));
        assert_eq!(producer.calls(), 1);
        Ok(())
    }

    #[test]
    fn eager_mode_always_produces() -> Result<()> {
        let fixture = fixture("movie.mkv")?;
        let producer = Arc::new(CountingProducer::default());
        let processor = processor(&fixture, Arc::clone(&producer), false)?;

        processor.process(&fixture.target)?;
        processor.process(&fixture.target)?;
        assert_eq!(producer.calls(), 2);
        Ok(())
    }

    #[test]
    fn lazy_mode_copies_inputs_already_in_target_format() -> Result<()> {
        let fixture = fixture("movie.MKV")?;
        let producer = Arc::new(CountingProducer::default());
        let processor = processor(&fixture, Arc::clone(&producer), true)?;

        let processed = processor.process(&fixture.target)?;
        assert!(matches!(processed, Processed::Copied(_)));
        assert_eq!(fs::read(processed.path())?, b"source");
        assert_eq!(fs::read(fixture.target.path())?, b"source");
        assert_eq!(producer.calls(), 0);
        assert_eq!(fs::read_dir(fixture.temp.path().join("stage"))?.count(), 0);
        Ok(())
    }

    #[test]
    fn unaccepted_originals_are_not_found() -> Result<()> {
        let fixture = fixture("movie.txt")?;
        let producer = Arc::new(CountingProducer::default());
        let processor = processor(&fixture, Arc::clone(&producer), true)?;

        let err = processor.process(&fixture.target).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(producer.calls(), 0);
        Ok(())
    }

    #[test]
    fn intermediate_artifact_is_preferred() -> Result<()> {
        let fixture = fixture("movie.avi")?;
        let ripped = ArtifactLayout::new(fixture.temp.path().join("ripped"), "mp4")?;
        let intermediate = ripped.output_path(&fixture.target);
        fs::create_dir_all(intermediate.parent().unwrap_or(fixture.temp.path()))?;
        fs::write(&intermediate, b"ripped")?;

        let producer = Arc::new(CountingProducer::default());
        let processor = ArtifactProcessor::builder("tag")
            .producer(Arc::clone(&producer) as Arc<dyn Producer>)
            .output(ArtifactLayout::new(fixture.temp.path().join("tagged"), "m4v")?)
            .intermediate(ripped)
            .accept(["avi"])
            .staging(StagingArea::new(
                fixture.temp.path().join("stage"),
                CharReplacements::default(),
            ))
            .lazy(true)
            .build()?;

        assert_eq!(processor.resolve_input(&fixture.target)?, intermediate);
        processor.process(&fixture.target)?;
        let calls = producer.calls.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(calls, vec![intermediate]);
        Ok(())
    }

    #[test]
    fn same_format_intermediate_still_runs_the_producer() -> Result<()> {
        let fixture = fixture("movie.avi")?;
        let ripped = ArtifactLayout::new(fixture.temp.path().join("ripped"), "mkv")?;
        let intermediate = ripped.output_path(&fixture.target);
        fs::create_dir_all(intermediate.parent().unwrap_or(fixture.temp.path()))?;
        fs::write(&intermediate, b"ripped")?;

        let producer = Arc::new(CountingProducer::default());
        let processor = ArtifactProcessor::builder("tag")
            .producer(Arc::clone(&producer) as Arc<dyn Producer>)
            .output(ArtifactLayout::new(fixture.temp.path().join("tagged"), "mkv")?)
            .intermediate(ripped)
            .staging(StagingArea::new(
                fixture.temp.path().join("stage"),
                CharReplacements::default(),
            ))
            .lazy(true)
            .build()?;

        let processed = processor.process(&fixture.target)?;
        assert!(matches!(processed, Processed::Produced(_)));
        assert_eq!(fs::read(processed.path())?, b"produced");
        assert_eq!(producer.calls(), 1);
        Ok(())
    }

    #[test]
    fn producer_failure_leaves_no_output() -> Result<()> {
        let fixture = fixture("movie.avi")?;
        let producer = Arc::new(CountingProducer {
            fail: true,
            ..CountingProducer::default()
        });
        let processor = processor(&fixture, producer, true)?;

        let err = processor
            .handle(&Job::for_path(&fixture.target.path()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ToolFailed { .. }));
        assert!(!fixture.temp.path().join("out/movies/tt1.mkv").exists());
        Ok(())
    }

    #[test]
    fn handler_forwards_the_artifact_path() -> Result<()> {
        let fixture = fixture("movie.avi")?;
        let processor = processor(&fixture, Arc::new(CountingProducer::default()), true)?;

        let jobs = processor.handle(&Job::for_path(&fixture.target.path()))?;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].path()?, fixture.target.path());
        let expected = fixture.temp.path().join("out/movies/tt1.mkv");
        assert_eq!(jobs[0].get("rip"), Some(expected.display().to_string().as_str()));
        Ok(())
    }
}
