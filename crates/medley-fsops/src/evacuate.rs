//! Staging of files into disposable private directories.
//!
//! # Design
//! - [`Evacuator::prepare`] validates the staging root and reserves a unique
//!   directory name; the directory itself is only created by the first
//!   successful [`EvacuationTarget::by`], so failed evacuations leak nothing.
//! - An [`Evacuation`] has two exits: commit ([`Evacuation::move_to`] or
//!   [`Evacuation::restore`]) or [`Evacuation::discard`]. Every exit removes the
//!   private directory, and dropping the handle discards as well.
//! - Removal of an already-removed directory counts as success, so repeated
//!   discards need no state flag.
//! - A moved file is the only copy of the user's data: when its commit rename
//!   fails, the private directory is kept and its location logged.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};

const STAGE_DIR_PREFIX: &str = "evac-";

/// Character substitutions applied to staged file names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharReplacements {
    map: BTreeMap<char, String>,
}

impl CharReplacements {
    /// Build a replacement table from `(from, to)` pairs.
    pub fn new(pairs: impl IntoIterator<Item = (char, String)>) -> Self {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    /// Substitutions that keep names portable across common filesystems.
    #[must_use]
    pub fn filesystem_safe() -> Self {
        Self::new(
            [':', '?', '*', '"', '<', '>', '|', '\\']
                .into_iter()
                .map(|ch| (ch, "_".to_string())),
        )
    }

    /// Apply the table to `name` in a single pass; replacements are not re-substituted.
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for ch in name.chars() {
            match self.map.get(&ch) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(ch),
            }
        }
        out
    }

    /// Number of configured substitutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no substitutions are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// How a file is placed into the staging directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvacuationStrategy {
    /// Atomic rename; fails across devices.
    Move,
    /// Full byte copy; the original is left untouched.
    Copy,
}

impl EvacuationStrategy {
    const fn operation(self) -> &'static str {
        match self {
            Self::Move => "evacuate.move",
            Self::Copy => "evacuate.copy",
        }
    }
}

/// Factory for evacuations sharing one private staging directory.
///
/// Discarding any evacuation produced by a factory removes the whole directory,
/// so callers normally prepare one factory per item.
#[derive(Debug)]
pub struct Evacuator {
    dir: PathBuf,
    replacements: CharReplacements,
}

impl Evacuator {
    /// Validate `staging_root` and reserve a unique private directory beneath it.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidConfig`] when the root is empty and
    /// [`FsOpsError::StagingRoot`] when it cannot be created or is not a directory.
    pub fn prepare(
        staging_root: impl AsRef<Path>,
        replacements: CharReplacements,
    ) -> FsOpsResult<Self> {
        let root = staging_root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(FsOpsError::InvalidConfig {
                field: "staging_root",
                reason: "empty",
                value: None,
            });
        }
        fs::create_dir_all(root).map_err(|source| FsOpsError::StagingRoot {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(FsOpsError::StagingRoot {
                path: root.to_path_buf(),
                source: io::Error::other("staging root is not a directory"),
            });
        }

        let dir = root.join(format!("{STAGE_DIR_PREFIX}{}", Uuid::new_v4().simple()));
        Ok(Self { dir, replacements })
    }

    /// Private directory holding every file evacuated through this factory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Describe the evacuation of `original` without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] when `original` does not exist.
    pub fn of(&self, original: impl AsRef<Path>) -> FsOpsResult<EvacuationTarget<'_>> {
        let original = original.as_ref();
        if !original.exists() {
            return Err(FsOpsError::not_found("evacuate.of", original));
        }
        let name = original
            .file_name()
            .map(|name| name.to_string_lossy())
            .ok_or_else(|| FsOpsError::InvalidConfig {
                field: "original_path",
                reason: "no file name",
                value: Some(original.display().to_string()),
            })?;
        let staged = self.dir.join(self.replacements.apply(&name));
        Ok(EvacuationTarget {
            evacuator: self,
            original: original.to_path_buf(),
            staged,
        })
    }
}

/// A planned evacuation; nothing is staged until [`EvacuationTarget::by`] runs.
#[derive(Debug)]
pub struct EvacuationTarget<'a> {
    evacuator: &'a Evacuator,
    original: PathBuf,
    staged: PathBuf,
}

impl EvacuationTarget<'_> {
    /// Location the file will occupy once staged.
    #[must_use]
    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    /// Stage the file using `strategy`.
    ///
    /// # Errors
    ///
    /// Returns the strategy's IO error verbatim (inside [`FsOpsError::Io`]); the
    /// private directory is not left behind empty.
    pub fn by(self, strategy: EvacuationStrategy) -> FsOpsResult<Evacuation> {
        let dir = self.evacuator.dir.clone();
        fs::create_dir_all(&dir)
            .map_err(|source| FsOpsError::io("evacuate.create_dir", &dir, source))?;

        let outcome = match strategy {
            EvacuationStrategy::Move => fs::rename(&self.original, &self.staged),
            EvacuationStrategy::Copy => fs::copy(&self.original, &self.staged).map(|_| ()),
        };

        if let Err(source) = outcome {
            // Only an empty directory is removed; siblings staged earlier survive.
            let _ = fs::remove_dir(&dir);
            return Err(FsOpsError::io(strategy.operation(), &self.original, source));
        }

        debug!(
            original = %self.original.display(),
            staged = %self.staged.display(),
            ?strategy,
            "file evacuated"
        );
        Ok(Evacuation {
            original: self.original,
            staged: self.staged,
            dir,
            strategy,
            retain: false,
        })
    }
}

/// A staged file awaiting commit or discard.
#[derive(Debug)]
pub struct Evacuation {
    original: PathBuf,
    staged: PathBuf,
    dir: PathBuf,
    strategy: EvacuationStrategy,
    retain: bool,
}

impl Evacuation {
    /// Current staged location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.staged
    }

    /// Path the file was evacuated from.
    #[must_use]
    pub fn original(&self) -> &Path {
        &self.original
    }

    /// Path for a scratch file inside the private directory.
    #[must_use]
    pub fn sibling(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Strategy the file was staged with.
    #[must_use]
    pub const fn strategy(&self) -> EvacuationStrategy {
        self.strategy
    }

    /// Rename the staged file back to its original location, then discard.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the rename or the directory removal fails. A
    /// moved file whose rename fails stays in the private directory.
    pub fn restore(mut self) -> FsOpsResult<()> {
        if let Err(source) = fs::rename(&self.staged, &self.original) {
            self.keep_moved_file();
            return Err(FsOpsError::io("evacuation.restore", &self.original, source));
        }
        debug!(original = %self.original.display(), "evacuated file restored");
        remove_stage_dir(&self.dir)
    }

    /// Rename the staged file to `destination`, then discard.
    ///
    /// Parent directories of `destination` are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the rename or the directory removal fails. A
    /// moved file whose rename fails stays in the private directory.
    pub fn move_to(mut self, destination: impl AsRef<Path>) -> FsOpsResult<PathBuf> {
        let destination = destination.as_ref();
        if let Some(parent) = destination.parent()
            && let Err(source) = fs::create_dir_all(parent)
        {
            self.keep_moved_file();
            return Err(FsOpsError::io("evacuation.create_parent", parent, source));
        }
        if let Err(source) = fs::rename(&self.staged, destination) {
            self.keep_moved_file();
            return Err(FsOpsError::io("evacuation.move_to", destination, source));
        }
        info!(
            original = %self.original.display(),
            destination = %destination.display(),
            "evacuation committed"
        );
        remove_stage_dir(&self.dir)?;
        Ok(destination.to_path_buf())
    }

    /// Remove the private directory and everything left inside it.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the directory exists but cannot be removed.
    pub fn discard(self) -> FsOpsResult<()> {
        remove_stage_dir(&self.dir)
    }

    fn keep_moved_file(&mut self) {
        if self.strategy == EvacuationStrategy::Move {
            self.retain = true;
            warn!(
                original = %self.original.display(),
                staged = %self.staged.display(),
                "commit failed; moved file kept in staging directory"
            );
        }
    }
}

impl Drop for Evacuation {
    fn drop(&mut self) {
        if self.retain {
            return;
        }
        if let Err(error) = remove_stage_dir(&self.dir) {
            warn!(dir = %self.dir.display(), error = ?error, "failed to discard staging directory");
        }
    }
}

fn remove_stage_dir(dir: &Path) -> FsOpsResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!(dir = %dir.display(), "staging directory discarded");
            Ok(())
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FsOpsError::io("evacuation.discard", dir, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn write_source(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn entries(dir: &Path) -> Result<usize> {
        Ok(fs::read_dir(dir)?.count())
    }

    #[test]
    fn replacements_apply_in_single_pass() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "small", b"data")?;
        let replacements = CharReplacements::new([
            ('t', "x".to_string()),
            ('a', "i".to_string()),
            ('l', "t".to_string()),
        ]);
        let evacuator = Evacuator::prepare(temp.path().join("work"), replacements)?;
        let target = evacuator.of(&source)?;
        assert!(target.staged_path().ends_with("smitt"));
        Ok(())
    }

    #[test]
    fn filesystem_safe_replaces_reserved_characters() {
        let safe = CharReplacements::filesystem_safe();
        assert_eq!(safe.apply("Alien: Covenant?.mkv"), "Alien_ Covenant_.mkv");
        assert!(!safe.is_empty());
    }

    #[test]
    fn prepare_rejects_empty_root() {
        let err = Evacuator::prepare("", CharReplacements::default()).unwrap_err();
        assert!(matches!(
            err,
            FsOpsError::InvalidConfig {
                field: "staging_root",
                ..
            }
        ));
    }

    #[test]
    fn prepare_rejects_file_root() -> Result<()> {
        let temp = TempDir::new()?;
        let file = write_source(temp.path(), "not-a-dir", b"x")?;
        let err = Evacuator::prepare(&file, CharReplacements::default()).unwrap_err();
        assert!(matches!(err, FsOpsError::StagingRoot { .. }));
        Ok(())
    }

    #[test]
    fn prepare_reserves_distinct_directories() -> Result<()> {
        let temp = TempDir::new()?;
        let first = Evacuator::prepare(temp.path(), CharReplacements::default())?;
        let second = Evacuator::prepare(temp.path(), CharReplacements::default())?;
        assert_ne!(first.dir(), second.dir());
        assert!(!first.dir().exists(), "directory is created lazily");
        Ok(())
    }

    #[test]
    fn move_to_commits_and_removes_stage_dir() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "movie.mkv", b"video")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Copy)?;
        assert_eq!(fs::read(evacuation.path())?, b"video");

        let destination = temp.path().join("out/nested/movie.mkv");
        let committed = evacuation.move_to(&destination)?;

        assert_eq!(committed, destination);
        assert_eq!(fs::read(&destination)?, b"video");
        assert!(!evacuator.dir().exists());
        assert!(source.exists(), "copy strategy leaves the original");
        Ok(())
    }

    #[test]
    fn discard_after_copy_keeps_original() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "track.m4a", b"audio")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Copy)?;
        evacuation.discard()?;

        assert!(!evacuator.dir().exists());
        assert_eq!(fs::read(&source)?, b"audio");
        Ok(())
    }

    #[test]
    fn discard_after_move_leaves_original_absent() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "episode.mkv", b"video")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Move)?;
        assert!(!source.exists());
        evacuation.discard()?;

        assert!(!evacuator.dir().exists());
        assert!(!source.exists());
        Ok(())
    }

    #[test]
    fn restore_returns_file_to_origin() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "episode.mkv", b"video")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Move)?;
        evacuation.restore()?;

        assert_eq!(fs::read(&source)?, b"video");
        assert!(!evacuator.dir().exists());
        Ok(())
    }

    #[test]
    fn failed_restore_keeps_moved_file() -> Result<()> {
        let temp = TempDir::new()?;
        let origin = temp.path().join("library");
        fs::create_dir_all(&origin)?;
        let source = write_source(&origin, "episode.mkv", b"video")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Move)?;
        let staged = evacuation.path().to_path_buf();
        fs::remove_dir(&origin)?;

        assert!(evacuation.restore().is_err());
        assert_eq!(fs::read(&staged)?, b"video");
        Ok(())
    }

    #[test]
    fn failed_copy_commit_still_discards() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "movie.mkv", b"video")?;
        let blocker = write_source(temp.path(), "blocker", b"file")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Copy)?;

        assert!(evacuation.move_to(blocker.join("out.mkv")).is_err());
        assert!(!evacuator.dir().exists());
        assert_eq!(fs::read(&source)?, b"video");
        Ok(())
    }

    #[test]
    fn dropping_handle_discards_stage_dir() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "movie.mkv", b"video")?;
        let evacuator = Evacuator::prepare(temp.path().join("work"), CharReplacements::default())?;
        {
            let evacuation = evacuator.of(&source)?.by(EvacuationStrategy::Copy)?;
            fs::write(evacuation.sibling("partial.mp4"), b"half")?;
            assert!(evacuator.dir().exists());
        }
        assert!(!evacuator.dir().exists());
        Ok(())
    }

    #[test]
    fn missing_original_leaks_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let work = temp.path().join("work");
        let evacuator = Evacuator::prepare(&work, CharReplacements::default())?;

        let err = evacuator.of(temp.path().join("absent.mkv")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(entries(&work)?, 0);
        Ok(())
    }

    #[test]
    fn failed_strategy_removes_empty_stage_dir() -> Result<()> {
        let temp = TempDir::new()?;
        let source = write_source(temp.path(), "movie.mkv", b"video")?;
        let work = temp.path().join("work");
        let evacuator = Evacuator::prepare(&work, CharReplacements::default())?;
        let target = evacuator.of(&source)?;
        fs::remove_file(&source)?;

        let err = target.by(EvacuationStrategy::Copy).unwrap_err();
        assert!(matches!(
            err,
            FsOpsError::Io {
                operation: "evacuate.copy",
                ..
            }
        ));
        assert_eq!(entries(&work)?, 0);
        Ok(())
    }

    #[test]
    fn remove_stage_dir_tolerates_missing_directory() -> Result<()> {
        let temp = TempDir::new()?;
        remove_stage_dir(&temp.path().join("never-created"))?;
        Ok(())
    }
}
