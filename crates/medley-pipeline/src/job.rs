//! Scheduler boundary: jobs in, successor jobs out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Parameter naming the file or directory a job operates on.
pub const PATH_PARAM: &str = "path";

/// One unit of work delivered by the scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Job {
    params: BTreeMap<String, String>,
}

impl Job {
    /// Job targeting `path`.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        Self::default().with(PATH_PARAM, path.display().to_string())
    }

    /// Job built from an arbitrary parameter map.
    #[must_use]
    pub const fn from_params(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All parameters.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Target path of the job.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingParam`] when `path` is absent or empty.
    pub fn path(&self) -> PipelineResult<PathBuf> {
        self.get(PATH_PARAM)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or(PipelineError::MissingParam { param: PATH_PARAM })
    }
}

/// A pipeline stage invoked once per job.
pub trait JobHandler: Send + Sync {
    /// Stage name used in logs.
    fn name(&self) -> &'static str;

    /// Process one job, returning zero or more successor jobs.
    ///
    /// # Errors
    ///
    /// Any error aborts this job only; other jobs are unaffected.
    fn handle(&self, job: &Job) -> PipelineResult<Vec<Job>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_param_is_required() {
        let job = Job::default().with("kind", "movie");
        assert!(matches!(
            job.path(),
            Err(PipelineError::MissingParam { param: "path" })
        ));
        assert!(matches!(
            Job::default().with(PATH_PARAM, "").path(),
            Err(PipelineError::MissingParam { .. })
        ));
    }

    #[test]
    fn for_path_round_trips_the_target() -> PipelineResult<()> {
        let job = Job::for_path(Path::new("/library/a.mkv")).with("stage", "rip");
        assert_eq!(job.path()?, PathBuf::from("/library/a.mkv"));
        assert_eq!(job.get("stage"), Some("rip"));
        assert_eq!(job.params().len(), 2);
        Ok(())
    }
}
