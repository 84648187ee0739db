//! Persistence of [`TargetInfo`] records beside scanned files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::TargetInfo;

/// Hidden directory holding records next to the media they describe.
pub const RECORD_DIR_NAME: &str = ".medley";
const RECORD_SUFFIX: &str = ".target.json";

/// Location of the record describing `media_path`.
#[must_use]
pub fn record_path(media_path: &Path) -> PathBuf {
    let name = media_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    media_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(RECORD_DIR_NAME)
        .join(format!("{name}{RECORD_SUFFIX}"))
}

/// Persist `target` beside its media file, replacing any previous record.
///
/// # Errors
///
/// Returns an error when serialisation or the write fails.
pub fn write_record(target: &TargetInfo) -> FsOpsResult<PathBuf> {
    let path = record_path(&target.path());
    let serialised = serde_json::to_vec_pretty(target)
        .map_err(|source| FsOpsError::json("record.serialise", &path, source))?;
    write_atomic(&path, &serialised)?;
    debug!(record = %path.display(), id = %target.id, "target record written");
    Ok(path)
}

/// Load the record describing `media_path`.
///
/// # Errors
///
/// Returns [`FsOpsError::NotFound`] when no record exists and a JSON error when
/// the record is corrupt.
pub fn read_record(media_path: &Path) -> FsOpsResult<TargetInfo> {
    let path = record_path(media_path);
    if !path.is_file() {
        return Err(FsOpsError::not_found("record.read", path));
    }
    let raw = fs::read(&path).map_err(|source| FsOpsError::io("record.read", &path, source))?;
    serde_json::from_slice(&raw).map_err(|source| FsOpsError::json("record.parse", &path, source))
}

/// Write `bytes` to `path` as a whole-file replacement.
///
/// Data lands in a uniquely named sibling first and is renamed into place, so
/// readers never observe a partial file. Parent directories are created.
///
/// # Errors
///
/// Returns an IO error when the directory, temporary file, or rename fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> FsOpsResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .map_err(|source| FsOpsError::io("write_atomic.create_parent", parent, source))?;
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{name}.{}.partial", Uuid::new_v4().simple()));
    fs::write(&temp, bytes).map_err(|source| {
        let _ = fs::remove_file(&temp);
        FsOpsError::io("write_atomic.write", &temp, source)
    })?;
    fs::rename(&temp, path).map_err(|source| {
        let _ = fs::remove_file(&temp);
        FsOpsError::io("write_atomic.rename", path, source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, TargetKind};
    use anyhow::Result;
    use tempfile::TempDir;

    fn sample(folder: &Path) -> TargetInfo {
        TargetInfo::from_identity(
            &folder.join("s01e02.mkv"),
            TargetKind::Episode,
            Identity {
                id: "tt7".to_string(),
                collection: Some(1),
                item: Some(2),
            },
        )
        .expect("valid path")
    }

    #[test]
    fn record_round_trips_beside_media() -> Result<()> {
        let temp = TempDir::new()?;
        let target = sample(temp.path());
        let written = write_record(&target)?;

        assert_eq!(
            written,
            temp.path().join(".medley").join("s01e02.mkv.target.json")
        );
        let loaded = read_record(&target.path())?;
        assert_eq!(loaded, target);
        Ok(())
    }

    #[test]
    fn missing_record_is_not_found() -> Result<()> {
        let temp = TempDir::new()?;
        let err = read_record(&temp.path().join("absent.mkv")).unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn corrupt_record_is_json_error() -> Result<()> {
        let temp = TempDir::new()?;
        let media = temp.path().join("movie.mkv");
        write_atomic(&record_path(&media), b"{not json")?;
        assert!(matches!(
            read_record(&media),
            Err(FsOpsError::Json { .. })
        ));
        Ok(())
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_partials() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("nested/value.json");
        write_atomic(&path, b"first")?;
        write_atomic(&path, b"second")?;

        assert_eq!(fs::read(&path)?, b"second");
        let leftovers = fs::read_dir(temp.path().join("nested"))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }
}
