//! In-memory collaborators for pipeline tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use medley_fsops::TargetInfo;
use medley_metadata::{Catalog, CatalogResult};
use medley_pipeline::{PipelineError, PipelineResult, Producer};
use serde_json::Value;

/// Catalog answering from fixed tables and counting every fetch.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    movies: BTreeMap<String, Value>,
    series: BTreeMap<String, Value>,
    episodes: BTreeMap<(String, u32, u32), Value>,
    images: BTreeMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl StaticCatalog {
    /// Empty catalog; every lookup fails until entries are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a movie payload.
    #[must_use]
    pub fn with_movie(mut self, id: &str, payload: Value) -> Self {
        self.movies.insert(id.to_string(), payload);
        self
    }

    /// Add a series payload.
    #[must_use]
    pub fn with_series(mut self, id: &str, payload: Value) -> Self {
        self.series.insert(id.to_string(), payload);
        self
    }

    /// Add an episode payload.
    #[must_use]
    pub fn with_episode(mut self, id: &str, season: u32, episode: u32, payload: Value) -> Self {
        self.episodes
            .insert((id.to_string(), season, episode), payload);
        self
    }

    /// Add image bytes for a poster reference.
    #[must_use]
    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }

    /// Number of fetches served or refused so far.
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup<K, V>(&self, table: &BTreeMap<K, V>, key: &K) -> CatalogResult<V>
    where
        K: Ord + std::fmt::Debug,
        V: Clone,
    {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        table
            .get(key)
            .cloned()
            .ok_or_else(|| format!("{key:?} not in catalog").into())
    }
}

impl Catalog for StaticCatalog {
    fn fetch_movie_info(&self, id: &str) -> CatalogResult<Value> {
        self.lookup(&self.movies, &id.to_string())
    }

    fn fetch_series_info(&self, id: &str) -> CatalogResult<Value> {
        self.lookup(&self.series, &id.to_string())
    }

    fn fetch_episode_info(&self, id: &str, season: u32, episode: u32) -> CatalogResult<Value> {
        self.lookup(&self.episodes, &(id.to_string(), season, episode))
    }

    fn fetch_image(&self, url: &str) -> CatalogResult<Vec<u8>> {
        self.lookup(&self.images, &url.to_string())
    }
}

/// One invocation observed by [`RecordingProducer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducedCall {
    /// Identifier of the target.
    pub id: String,
    /// Input handed to the producer.
    pub input: PathBuf,
    /// Output requested from the producer.
    pub output: PathBuf,
}

/// Producer that records its calls and writes `input bytes + marker` to the output.
#[derive(Debug, Default)]
pub struct RecordingProducer {
    marker: Vec<u8>,
    fail: bool,
    calls: Mutex<Vec<ProducedCall>>,
}

impl RecordingProducer {
    /// Producer appending `marker` to every artifact.
    #[must_use]
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    /// Producer that fails every call after recording it.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Calls observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProducedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Producer for RecordingProducer {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn produce(&self, target: &TargetInfo, input: &Path, output: &Path) -> PipelineResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ProducedCall {
                id: target.id.clone(),
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            });
        }
        if self.fail {
            return Err(PipelineError::ToolFailed {
                program: "recording".to_string(),
                status: Some(1),
                stderr: "configured to fail".to_string(),
            });
        }
        let mut bytes = fs::read(input).map_err(|source| PipelineError::Io {
            operation: "recording.read",
            path: input.to_path_buf(),
            source,
        })?;
        bytes.extend_from_slice(&self.marker);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
                operation: "recording.create_dir",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(output, bytes).map_err(|source| PipelineError::Io {
            operation: "recording.write",
            path: output.to_path_buf(),
            source,
        })
    }
}
