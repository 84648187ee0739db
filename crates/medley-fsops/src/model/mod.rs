//! Domain models for scanned library items.
//!
//! # Design
//! - Keep identity types small and serialisable; they are persisted beside every scanned file.
//! - Absent collection/item numbers are `None`, never zero.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of library item a scanned file represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A feature film.
    Movie,
    /// One episode of a series.
    Episode,
    /// An audio track or album item.
    Audio,
}

impl TargetKind {
    /// Name used in persisted records and job parameters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
            Self::Audio => "audio",
        }
    }

    /// Directory label used when laying out artifacts for this kind.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Movie => "movies",
            Self::Episode => "series",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity extracted from a filesystem path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Catalog identifier.
    pub id: String,
    /// Optional collection number (for example a season).
    pub collection: Option<u32>,
    /// Optional item number (for example an episode).
    pub item: Option<u32>,
}

/// Identity of a scanned item, persisted beside the scanned file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// File name of the scanned item.
    pub file_name: String,
    /// Folder containing the scanned item.
    pub folder: PathBuf,
    /// Kind of item.
    pub kind: TargetKind,
    /// Catalog identifier; never empty once resolved.
    pub id: String,
    /// Optional collection number.
    pub collection: Option<u32>,
    /// Optional item number.
    pub item: Option<u32>,
    /// When the scanner produced this record.
    pub scanned_at: DateTime<Utc>,
}

impl TargetInfo {
    /// Build a record for `path` from an extracted identity.
    ///
    /// Returns `None` when `path` has no file name or parent folder.
    #[must_use]
    pub fn from_identity(path: &Path, kind: TargetKind, identity: Identity) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        let folder = path.parent()?.to_path_buf();
        Some(Self {
            file_name,
            folder,
            kind,
            id: identity.id,
            collection: identity.collection,
            item: identity.item,
            scanned_at: Utc::now(),
        })
    }

    /// Absolute path of the scanned file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }

    /// Identity portion of the record.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            collection: self.collection,
            item: self.item,
        }
    }

    /// File stem of the scanned item, used as a fallback title.
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.file_name)
    }

    /// Lowercase extension of the scanned file, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_identity_splits_folder_and_name() {
        let info = TargetInfo::from_identity(
            Path::new("/library/Show/s01e07.mkv"),
            TargetKind::Episode,
            Identity {
                id: "tt42".to_string(),
                collection: Some(1),
                item: Some(7),
            },
        )
        .expect("path has a parent and file name");

        assert_eq!(info.file_name, "s01e07.mkv");
        assert_eq!(info.folder, PathBuf::from("/library/Show"));
        assert_eq!(info.path(), PathBuf::from("/library/Show/s01e07.mkv"));
        assert_eq!(info.stem(), "s01e07");
        assert_eq!(info.extension().as_deref(), Some("mkv"));
        assert_eq!(info.identity().item, Some(7));
    }

    #[test]
    fn kind_display_matches_serialised_name() -> anyhow::Result<()> {
        for kind in [TargetKind::Movie, TargetKind::Episode, TargetKind::Audio] {
            assert_eq!(serde_json::to_string(&kind)?, format!("\"{kind}\""));
        }
        assert_eq!(TargetKind::Episode.to_string(), "episode");
        assert_eq!(TargetKind::Episode.dir_name(), "series");
        Ok(())
    }
}
