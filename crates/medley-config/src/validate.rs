//! Semantic validation of a parsed configuration document.

use std::path::Path;

use medley_fsops::PathMatcher;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{MedleyConfig, StageConfig, ToolConfig};

impl MedleyConfig {
    /// Check every section, stopping at the first problem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the section and field at fault.
    pub fn validate(&self) -> ConfigResult<()> {
        require_path("staging", "root", &self.staging.root)?;
        require_path("repository", "root", &self.repository.root)?;
        require_path("output", "rip_root", &self.output.rip_root)?;
        require_path("output", "tag_root", &self.output.tag_root)?;

        for key in self.staging.replacements.keys() {
            if key.chars().count() != 1 {
                return Err(ConfigError::invalid(
                    "staging",
                    "replacements",
                    Some(key.clone()),
                    "keys must be single characters",
                ));
            }
        }

        let patterns = self.patterns.sub_patterns();
        for (index, library) in self.libraries.iter().enumerate() {
            let section = format!("libraries[{index}]");
            if library.name.trim().is_empty() {
                return Err(ConfigError::invalid(section, "name", None, "empty"));
            }
            require_path(&section, "root", &library.root)?;
            if library.templates.is_empty() {
                return Err(ConfigError::invalid(section, "templates", None, "empty"));
            }
            if let Err(error) = PathMatcher::compile(&library.templates, &patterns) {
                return Err(ConfigError::invalid(
                    section,
                    "templates",
                    Some(format!("{error:?}")),
                    "template or pattern does not compile",
                ));
            }
        }

        validate_stage("rip", &self.rip)?;
        validate_stage("tag", &self.tag)?;
        if let Some(catalog) = &self.catalog {
            validate_tool("catalog", catalog)?;
        }
        if let Some(format) = self.logging.log_format.as_deref()
            && !matches!(format, "json" | "pretty")
        {
            return Err(ConfigError::invalid(
                "logging",
                "log_format",
                Some(format.to_string()),
                "must be json or pretty",
            ));
        }
        Ok(())
    }
}

fn require_path(section: &str, field: &str, path: &Path) -> ConfigResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::invalid(section, field, None, "empty"));
    }
    Ok(())
}

fn validate_stage(section: &str, stage: &StageConfig) -> ConfigResult<()> {
    validate_tool(section, &stage.tool)?;
    if stage.format.trim().trim_start_matches('.').is_empty() {
        return Err(ConfigError::invalid(section, "format", None, "empty"));
    }
    Ok(())
}

fn validate_tool(section: &str, tool: &ToolConfig) -> ConfigResult<()> {
    if tool.program.trim().is_empty() {
        return Err(ConfigError::invalid(section, "program", None, "empty"));
    }
    if tool.timeout_secs == 0 {
        return Err(ConfigError::invalid(
            section,
            "timeout_secs",
            Some("0".to_string()),
            "must be positive",
        ));
    }
    Ok(())
}
