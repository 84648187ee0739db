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

//! Filesystem layer of the media pipeline: staging, scanning, and target records.
//!
//! Layout: `evacuate.rs` (private staging transactions), `scan.rs` (path templates
//! and library walking), `record.rs` (`TargetInfo` persistence), `model/` (identity
//! types), `error.rs` (`FsOpsError`).

pub mod error;
pub mod evacuate;
pub mod model;
pub mod record;
pub mod scan;

pub use error::{FsOpsError, FsOpsResult};
pub use evacuate::{CharReplacements, Evacuation, EvacuationStrategy, EvacuationTarget, Evacuator};
pub use model::{Identity, TargetInfo, TargetKind};
pub use record::{RECORD_DIR_NAME, read_record, record_path, write_atomic, write_record};
pub use scan::{PathMatcher, Scanner, SubPatterns};
