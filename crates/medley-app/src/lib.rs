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
#![allow(clippy::multiple_crate_versions)]

//! Media pipeline application wiring.
//!
//! Layout: `bootstrap.rs` (config and logging), `runner.rs` (stage wiring and
//! the sequential run), `error.rs` (`AppError`).

/// Application bootstrap and configuration loading.
pub mod bootstrap;
/// Application-level errors.
pub mod error;
/// Stage wiring and the one-shot run.
pub mod runner;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
pub use runner::{Pipeline, RunSummary};
