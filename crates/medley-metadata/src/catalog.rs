//! Capability interface for the external metadata catalog.

use serde_json::Value;

/// Error type returned by catalog implementations.
pub type CatalogError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for catalog fetches.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Source of descriptive metadata and artwork.
///
/// Records are returned as raw JSON objects and mapped into typed records by the
/// repository, which rejects payloads missing required fields. Implementations own
/// their transport, credentials, and timeout policy.
pub trait Catalog: Send + Sync {
    /// Fetch the record for a movie.
    ///
    /// # Errors
    ///
    /// Returns the implementation's transport or lookup error.
    fn fetch_movie_info(&self, id: &str) -> CatalogResult<Value>;

    /// Fetch the record for a series.
    ///
    /// # Errors
    ///
    /// Returns the implementation's transport or lookup error.
    fn fetch_series_info(&self, id: &str) -> CatalogResult<Value>;

    /// Fetch the record for one episode of a series.
    ///
    /// # Errors
    ///
    /// Returns the implementation's transport or lookup error.
    fn fetch_episode_info(&self, id: &str, season: u32, episode: u32) -> CatalogResult<Value>;

    /// Fetch raw image bytes for a poster reference.
    ///
    /// # Errors
    ///
    /// Returns the implementation's transport or lookup error.
    fn fetch_image(&self, url: &str) -> CatalogResult<Vec<u8>>;
}
