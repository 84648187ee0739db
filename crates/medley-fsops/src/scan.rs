//! Path templates and library scanning.
//!
//! # Design
//! - Templates are slash-separated regex fragments with `<id>`, `<collection>` and
//!   `<itemno>` placeholders, compiled once into anchored matchers.
//! - A template with N segments only sees the last N path components.
//! - Templates are tried in configured order; the first one that yields a
//!   non-empty id wins.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Captures, Regex};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{Identity, TargetInfo, TargetKind};
use crate::record::RECORD_DIR_NAME;

const ID_PLACEHOLDER: &str = "<id>";
const COLLECTION_PLACEHOLDER: &str = "<collection>";
const ITEM_PLACEHOLDER: &str = "<itemno>";

/// Default regex fragment for catalog identifiers.
pub const DEFAULT_ID_PATTERN: &str = r"[a-z]{2}\d+";
/// Default regex fragment for collection numbers.
pub const DEFAULT_COLLECTION_PATTERN: &str = r"\d+";
/// Default regex fragment for item numbers.
pub const DEFAULT_ITEM_PATTERN: &str = r"\d+";

/// Regex fragments substituted for the template placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubPatterns {
    /// Fragment for `<id>`.
    pub id: String,
    /// Fragment for `<collection>`.
    pub collection: String,
    /// Fragment for `<itemno>`.
    pub item: String,
}

impl Default for SubPatterns {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID_PATTERN.to_string(),
            collection: DEFAULT_COLLECTION_PATTERN.to_string(),
            item: DEFAULT_ITEM_PATTERN.to_string(),
        }
    }
}

#[derive(Debug)]
struct CompiledTemplate {
    source: String,
    segments: usize,
    regex: Regex,
}

impl CompiledTemplate {
    fn compile(template: &str, patterns: &SubPatterns) -> FsOpsResult<Self> {
        let expanded = template
            .replace(ID_PLACEHOLDER, &format!("(?P<id>{})", patterns.id))
            .replace(
                COLLECTION_PLACEHOLDER,
                &format!("(?P<collection>{})", patterns.collection),
            )
            .replace(ITEM_PLACEHOLDER, &format!("(?P<itemno>{})", patterns.item));
        let regex = Regex::new(&format!("^(?:{expanded})$")).map_err(|source| {
            FsOpsError::Pattern {
                pattern: template.to_string(),
                source,
            }
        })?;
        Ok(Self {
            source: template.to_string(),
            segments: template.split('/').count(),
            regex,
        })
    }

    fn identity(&self, components: &[String]) -> Option<Identity> {
        if components.len() < self.segments {
            return None;
        }
        let tail = components[components.len() - self.segments..].join("/");
        let captures = self.regex.captures(&tail)?;
        let id = captures
            .name("id")
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())?;
        let collection = parse_number(&captures, "collection").ok()?;
        let item = parse_number(&captures, "itemno").ok()?;
        Some(Identity {
            id: id.to_string(),
            collection,
            item,
        })
    }
}

/// Unparsable numbers disqualify the template rather than reading as unset.
fn parse_number(captures: &Captures<'_>, group: &str) -> Result<Option<u32>, ()> {
    captures
        .name(group)
        .map(|m| m.as_str().parse::<u32>().map_err(|_| ()))
        .transpose()
}

/// Ordered list of compiled path templates.
#[derive(Debug)]
pub struct PathMatcher {
    templates: Vec<CompiledTemplate>,
}

impl PathMatcher {
    /// Compile `templates` in order, expanding placeholders with `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidConfig`] for an empty template list and
    /// [`FsOpsError::Pattern`] when a template does not compile.
    pub fn compile<S: AsRef<str>>(templates: &[S], patterns: &SubPatterns) -> FsOpsResult<Self> {
        if templates.is_empty() {
            return Err(FsOpsError::InvalidConfig {
                field: "templates",
                reason: "empty",
                value: None,
            });
        }
        let templates = templates
            .iter()
            .map(|template| CompiledTemplate::compile(template.as_ref(), patterns))
            .collect::<FsOpsResult<Vec<_>>>()?;
        Ok(Self { templates })
    }

    /// Extract the identity of `path` using the first template that matches.
    #[must_use]
    pub fn match_path(&self, path: &Path) -> Option<Identity> {
        let components = path
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>();
        self.templates.iter().find_map(|template| {
            let identity = template.identity(&components)?;
            debug!(path = %path.display(), template = %template.source, id = %identity.id, "template matched");
            Some(identity)
        })
    }
}

/// Walks a library tree and extracts a [`TargetInfo`] for every matching file.
#[derive(Debug)]
pub struct Scanner {
    kind: TargetKind,
    matcher: PathMatcher,
    exclude_dirs: Vec<String>,
    media: Option<GlobSet>,
}

impl Scanner {
    /// Build a scanner for one library.
    ///
    /// `media_globs` restricts the files considered; an empty list accepts all files.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Glob`] when a media glob does not compile.
    pub fn new(
        kind: TargetKind,
        matcher: PathMatcher,
        exclude_dirs: Vec<String>,
        media_globs: &[String],
    ) -> FsOpsResult<Self> {
        Ok(Self {
            kind,
            matcher,
            exclude_dirs: exclude_dirs
                .into_iter()
                .filter(|dir| !dir.is_empty())
                .collect(),
            media: build_globset(media_globs)?,
        })
    }

    /// Kind assigned to every target this scanner produces.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Walk `root` and return the targets found, in file-name order.
    ///
    /// Files matching no template are skipped. Unreadable entries are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NotFound`] when `root` is not a directory.
    pub fn scan(&self, root: &Path) -> FsOpsResult<Vec<TargetInfo>> {
        if !root.is_dir() {
            return Err(FsOpsError::not_found("scan.root", root));
        }
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        info!(root = %root.display(), kind = %self.kind, "library scan started");

        let mut targets = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let error = FsOpsError::walkdir("scan.walk", &root, error);
                    warn!(error = ?error, "skipping unreadable library entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.accepts(&root, entry.path()) {
                continue;
            }
            let Some(identity) = self.matcher.match_path(entry.path()) else {
                debug!(path = %entry.path().display(), "no template matched; skipping");
                continue;
            };
            if let Some(target) = TargetInfo::from_identity(entry.path(), self.kind, identity) {
                targets.push(target);
            }
        }

        info!(root = %root.display(), found = targets.len(), "library scan finished");
        Ok(targets)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        if entry.file_name() == RECORD_DIR_NAME {
            return true;
        }
        let absolute = entry.path().to_string_lossy();
        self.exclude_dirs
            .iter()
            .any(|exclude| absolute.contains(exclude.as_str()))
    }

    fn accepts(&self, root: &Path, path: &Path) -> bool {
        let Some(media) = &self.media else {
            return true;
        };
        let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        media.is_match(relative)
    }
}

fn build_globset(patterns: &[String]) -> FsOpsResult<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(|source| FsOpsError::Glob {
            operation: "scan.compile_glob",
            pattern: pattern.clone(),
            source,
        })?);
    }
    builder.build().map(Some).map_err(|source| FsOpsError::Glob {
        operation: "scan.build_globset",
        pattern: patterns.join(","),
        source,
    })
}
