#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Metadata resolution for the media pipeline.
//!
//! Layout: `catalog.rs` (fetch capability), `model.rs` (typed records),
//! `cache.rs` (lazy path-keyed cache), `repository.rs` (on-disk layout),
//! `error.rs` (`MetadataError`).

pub mod cache;
pub mod catalog;
pub mod error;
pub mod model;
pub mod repository;

pub use cache::ResolutionCache;
pub use catalog::{Catalog, CatalogError, CatalogResult};
pub use error::{MetadataError, MetadataResult};
pub use model::{EpisodeInfo, MetaInfo, MovieInfo, SeriesInfo};
pub use repository::MetadataRepository;
