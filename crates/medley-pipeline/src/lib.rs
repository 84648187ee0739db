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

//! Stage handlers of the media pipeline and the external tools they drive.
//!
//! Layout: `job.rs` (scheduler boundary), `tool.rs` (bounded process runner),
//! `layout.rs` (artifact paths), `staging.rs` (evacuation settings),
//! `processor.rs` (shared rip/tag skeleton), `producers.rs` (rip and tag tools),
//! `catalog.rs` (command-backed catalog), `handlers.rs` (scan and resolve stages),
//! `error.rs` (`PipelineError`).

pub mod catalog;
pub mod error;
pub mod handlers;
pub mod job;
pub mod layout;
pub mod processor;
pub mod producers;
pub mod staging;
pub mod tool;

pub use catalog::CommandCatalog;
pub use error::{PipelineError, PipelineResult};
pub use handlers::{ResolveHandler, ScanHandler};
pub use job::{Job, JobHandler, PATH_PARAM};
pub use layout::ArtifactLayout;
pub use processor::{ArtifactProcessor, ArtifactProcessorBuilder, Processed, Producer};
pub use producers::{RipProducer, TagProducer};
pub use staging::StagingArea;
pub use tool::{ExternalTool, ToolOutput, ToolVars};
