//! Metadata repository: deterministic cache layout over a [`ResolutionCache`].
//!
//! Layout under the repository root:
//! - `movies/{id}.json`
//! - `series/{id}.json` and `series/{id}.{season}.{episode}.json`
//! - `imgs/{id}.{ext}` with the extension taken from the poster reference

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::cache::ResolutionCache;
use crate::catalog::Catalog;
use crate::error::{MetadataError, MetadataResult};
use crate::model::{EpisodeInfo, MovieInfo, SeriesInfo};

const RECORD_EXT: &str = "json";
const DEFAULT_IMAGE_EXT: &str = "jpg";
const MOVIES_DIR: &str = "movies";
const SERIES_DIR: &str = "series";
const IMAGES_DIR: &str = "imgs";

/// Filesystem-backed store of resolved metadata and artwork.
#[derive(Clone, Debug)]
pub struct MetadataRepository {
    root: PathBuf,
    cache: ResolutionCache,
}

impl MetadataRepository {
    /// Open a repository rooted at `root` with the given reuse policy.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidConfig`] when `root` is empty.
    pub fn new(root: impl Into<PathBuf>, lazy: bool) -> MetadataResult<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(MetadataError::InvalidConfig {
                field: "repository_root",
                reason: "empty",
            });
        }
        Ok(Self {
            root,
            cache: ResolutionCache::new(lazy),
        })
    }

    /// Repository root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether cached entries are reused.
    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        self.cache.is_lazy()
    }

    /// Cache path of a movie record.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidIdentity`] when `id` cannot name a file.
    pub fn movie_path(&self, id: &str) -> MetadataResult<PathBuf> {
        check_id(id)?;
        Ok(self
            .root
            .join(MOVIES_DIR)
            .join(format!("{id}.{RECORD_EXT}")))
    }

    /// Cache path of a series record.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidIdentity`] when `id` cannot name a file.
    pub fn series_path(&self, id: &str) -> MetadataResult<PathBuf> {
        check_id(id)?;
        Ok(self
            .root
            .join(SERIES_DIR)
            .join(format!("{id}.{RECORD_EXT}")))
    }

    /// Cache path of an episode record.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidIdentity`] when `id` cannot name a file.
    pub fn episode_path(&self, id: &str, season: u32, episode: u32) -> MetadataResult<PathBuf> {
        check_id(id)?;
        Ok(self
            .root
            .join(SERIES_DIR)
            .join(format!("{id}.{season}.{episode}.{RECORD_EXT}")))
    }

    /// Cache path of the poster for `id`, keeping the extension of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidIdentity`] when `id` cannot name a file.
    pub fn poster_path(&self, id: &str, url: &str) -> MetadataResult<PathBuf> {
        check_id(id)?;
        Ok(self
            .root
            .join(IMAGES_DIR)
            .join(format!("{id}.{}", image_extension(url))))
    }

    /// Resolve the movie record for `id`.
    ///
    /// # Errors
    ///
    /// Returns catalog, mapping, or persistence errors.
    pub fn resolve_movie(&self, id: &str, catalog: &dyn Catalog) -> MetadataResult<MovieInfo> {
        let key = self.movie_path(id)?;
        self.cache.resolve(&key, || {
            let payload = catalog
                .fetch_movie_info(id)
                .map_err(|source| MetadataError::fetch("movie", id, source))?;
            MovieInfo::from_payload(id, &payload)
        })
    }

    /// Resolve the series record for `id`.
    ///
    /// # Errors
    ///
    /// Returns catalog, mapping, or persistence errors.
    pub fn resolve_series(&self, id: &str, catalog: &dyn Catalog) -> MetadataResult<SeriesInfo> {
        let key = self.series_path(id)?;
        self.cache.resolve(&key, || {
            let payload = catalog
                .fetch_series_info(id)
                .map_err(|source| MetadataError::fetch("series", id, source))?;
            SeriesInfo::from_payload(id, &payload)
        })
    }

    /// Resolve one episode record of series `id`.
    ///
    /// # Errors
    ///
    /// Returns catalog, mapping, or persistence errors.
    pub fn resolve_episode(
        &self,
        id: &str,
        season: u32,
        episode: u32,
        catalog: &dyn Catalog,
    ) -> MetadataResult<EpisodeInfo> {
        let key = self.episode_path(id, season, episode)?;
        self.cache.resolve(&key, || {
            let payload = catalog
                .fetch_episode_info(id, season, episode)
                .map_err(|source| {
                    MetadataError::fetch("episode", format!("{id}.{season}.{episode}"), source)
                })?;
            EpisodeInfo::from_payload(id, &payload)
        })
    }

    /// Resolve the poster image for `id` from reference `url`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns catalog or persistence errors, or [`MetadataError::EmptyImage`].
    pub fn resolve_poster(
        &self,
        id: &str,
        url: &str,
        catalog: &dyn Catalog,
    ) -> MetadataResult<PathBuf> {
        let key = self.poster_path(id, url)?;
        let path = self.cache.resolve_bytes(&key, || {
            let bytes = catalog
                .fetch_image(url)
                .map_err(|source| MetadataError::fetch("image", url, source))?;
            if bytes.is_empty() {
                return Err(MetadataError::EmptyImage {
                    id: id.to_string(),
                    url: url.to_string(),
                });
            }
            Ok(bytes)
        })?;
        info!(id, poster = %path.display(), "poster resolved");
        Ok(path)
    }

    /// Read a cached movie record without contacting the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] when the record was never resolved.
    pub fn cached_movie(&self, id: &str) -> MetadataResult<MovieInfo> {
        read_entry("movie", &self.movie_path(id)?)
    }

    /// Read a cached series record without contacting the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] when the record was never resolved.
    pub fn cached_series(&self, id: &str) -> MetadataResult<SeriesInfo> {
        read_entry("series", &self.series_path(id)?)
    }

    /// Read a cached episode record without contacting the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] when the record was never resolved.
    pub fn cached_episode(&self, id: &str, season: u32, episode: u32) -> MetadataResult<EpisodeInfo> {
        read_entry("episode", &self.episode_path(id, season, episode)?)
    }

    /// Locate a cached poster for `id`, whatever its extension.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the image directory exists but cannot be listed.
    pub fn cached_poster(&self, id: &str) -> MetadataResult<Option<PathBuf>> {
        check_id(id)?;
        let dir = self.root.join(IMAGES_DIR);
        if !dir.is_dir() {
            return Ok(None);
        }
        let prefix = format!("{id}.");
        let entries =
            fs::read_dir(&dir).map_err(|source| MetadataError::io("poster.list", &dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| MetadataError::io("poster.list", &dir, source))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && !name[prefix.len()..].contains('.') {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }
}

fn read_entry<T: DeserializeOwned>(kind: &'static str, path: &Path) -> MetadataResult<T> {
    if !path.is_file() {
        return Err(MetadataError::NotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read(path).map_err(|source| MetadataError::io("cache.read", path, source))?;
    serde_json::from_slice(&raw).map_err(|source| MetadataError::json("cache.decode", path, source))
}

fn check_id(id: &str) -> MetadataResult<()> {
    let reason = if id.trim().is_empty() {
        "empty"
    } else if id.contains(['/', '\\']) || id == "." || id == ".." {
        "not a file name"
    } else if id.contains('.') {
        "dots are reserved for episode numbers"
    } else {
        return Ok(());
    };
    Err(MetadataError::InvalidIdentity {
        reason,
        id: id.to_string(),
    })
}

/// Extension of the last path segment of `url`, ignoring query and fragment.
fn image_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    Path::new(segment)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|ch| ch.is_ascii_alphanumeric()))
        .map_or_else(|| DEFAULT_IMAGE_EXT.to_string(), str::to_ascii_lowercase)
}
