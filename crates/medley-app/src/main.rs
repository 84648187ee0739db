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

//! Binary entrypoint that loads configuration and runs every stage once.

use medley_app::{AppResult, run_app};

/// Runs the pipeline over every configured library and exits.
fn main() -> AppResult<()> {
    run_app().map(|_| ())
}
