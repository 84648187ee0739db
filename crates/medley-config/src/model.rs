//! Typed configuration document.
//!
//! # Design
//! - Plain serde data carriers; semantic checks live in `validate.rs`.
//! - Conversions into the filesystem layer's types sit beside the data they read.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use medley_fsops::{CharReplacements, SubPatterns, TargetKind};
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedleyConfig {
    /// Libraries scanned by the pipeline.
    #[serde(default)]
    pub libraries: Vec<LibraryConfig>,
    /// Regex fragments for template placeholders.
    #[serde(default)]
    pub patterns: PatternConfig,
    /// Evacuation settings.
    pub staging: StagingConfig,
    /// Metadata repository settings.
    pub repository: RepositoryConfig,
    /// Artifact output roots.
    pub output: OutputConfig,
    /// Reuse existing cache entries and outputs.
    #[serde(default = "defaults::lazy")]
    pub lazy: bool,
    /// Encoder stage.
    pub rip: StageConfig,
    /// Tagger stage.
    pub tag: StageConfig,
    /// Command-backed metadata catalog.
    #[serde(default)]
    pub catalog: Option<ToolConfig>,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Kind of media a library holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryKind {
    /// Feature films.
    Movies,
    /// Episodic series.
    Series,
    /// Audio tracks.
    Audio,
}

impl LibraryKind {
    /// Kind assigned to items scanned from a library of this kind.
    #[must_use]
    pub const fn target_kind(self) -> TargetKind {
        match self {
            Self::Movies => TargetKind::Movie,
            Self::Series => TargetKind::Episode,
            Self::Audio => TargetKind::Audio,
        }
    }
}

/// One scanned library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Display name used in logs.
    pub name: String,
    /// Root directory walked by the scanner.
    pub root: PathBuf,
    /// Media kind of the library.
    pub kind: LibraryKind,
    /// Directory path substrings to skip.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Ordered path templates, most specific first.
    pub templates: Vec<String>,
    /// Glob filter over paths relative to `root`; empty accepts all files.
    #[serde(default)]
    pub media_globs: Vec<String>,
}

/// Regex fragments for `<id>`, `<collection>`, and `<itemno>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Fragment for `<id>`.
    pub id: String,
    /// Fragment for `<collection>`.
    pub collection: String,
    /// Fragment for `<itemno>`.
    pub item: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        let SubPatterns {
            id,
            collection,
            item,
        } = SubPatterns::default();
        Self {
            id,
            collection,
            item,
        }
    }
}

impl PatternConfig {
    /// Fragments in the scanner's representation.
    #[must_use]
    pub fn sub_patterns(&self) -> SubPatterns {
        SubPatterns {
            id: self.id.clone(),
            collection: self.collection.clone(),
            item: self.item.clone(),
        }
    }
}

/// Evacuation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Work directory holding private staging directories.
    pub root: PathBuf,
    /// Single-character keys mapped to their replacement in staged names.
    #[serde(default = "defaults::replacements")]
    pub replacements: BTreeMap<String, String>,
}

impl StagingConfig {
    /// Replacement table; keys that are not exactly one character are skipped.
    #[must_use]
    pub fn char_replacements(&self) -> CharReplacements {
        CharReplacements::new(self.replacements.iter().filter_map(|(from, to)| {
            let mut chars = from.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Some((ch, to.clone())),
                _ => None,
            }
        }))
    }
}

/// Metadata repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository root directory.
    pub root: PathBuf,
}

/// Artifact output roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root for encoded artifacts.
    pub rip_root: PathBuf,
    /// Root for tagged artifacts.
    pub tag_root: PathBuf,
}

/// External program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Program name or path.
    pub program: String,
    /// Argument templates with `{placeholder}` substitutions.
    #[serde(default)]
    pub args: Vec<String>,
    /// Time budget in seconds.
    #[serde(default = "defaults::tool_timeout_secs")]
    pub timeout_secs: u64,
    /// Capture stdout and stderr instead of discarding them.
    #[serde(default)]
    pub capture_output: bool,
}

impl ToolConfig {
    /// Time budget as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A producing stage: its tool plus target format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Tool invoked by the stage.
    #[serde(flatten)]
    pub tool: ToolConfig,
    /// Target extension of produced artifacts.
    pub format: String,
    /// Source extensions usable without an intermediate artifact; empty accepts any.
    #[serde(default)]
    pub accept: Vec<String>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Level or filter directive.
    #[serde(default = "defaults::log_level")]
    pub level: String,
    /// `json` or `pretty`; inferred from the build when absent.
    #[serde(default)]
    pub log_format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            log_format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn library_kinds_map_to_target_kinds() {
        assert_eq!(LibraryKind::Movies.target_kind(), TargetKind::Movie);
        assert_eq!(LibraryKind::Series.target_kind(), TargetKind::Episode);
        assert_eq!(LibraryKind::Audio.target_kind(), TargetKind::Audio);
    }

    #[test]
    fn replacement_table_skips_multi_char_keys() {
        let staging = StagingConfig {
            root: PathBuf::from("/work"),
            replacements: BTreeMap::from([
                ("t".to_string(), "x".to_string()),
                ("ab".to_string(), "y".to_string()),
            ]),
        };
        let table = staging.char_replacements();
        assert_eq!(table.len(), 1);
        assert_eq!(table.apply("tab"), "xab");
    }

    #[test]
    fn stage_tool_fields_are_flattened() -> anyhow::Result<()> {
        let stage: StageConfig = serde_json::from_value(json!({
            "program": "encoder",
            "args": ["{input}", "{output}"],
            "format": "mkv",
        }))?;
        assert_eq!(stage.tool.program, "encoder");
        assert_eq!(stage.tool.timeout_secs, 3_600);
        assert!(!stage.tool.capture_output);
        assert!(stage.accept.is_empty());
        Ok(())
    }
}
