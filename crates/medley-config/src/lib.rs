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

//! File-backed configuration for the media pipeline.
//!
//! Layout: `model.rs` (typed config document), `defaults.rs` (default values),
//! `validate.rs` (semantic checks), `loader.rs` (JSON file loading),
//! `error.rs` (`ConfigError`).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};
pub use error::{ConfigError, ConfigResult};
pub use loader::{config_path_from_env, load_config};
pub use model::{
    LibraryConfig, LibraryKind, LoggingSettings, MedleyConfig, OutputConfig, PatternConfig,
    RepositoryConfig, StageConfig, StagingConfig, ToolConfig,
};
