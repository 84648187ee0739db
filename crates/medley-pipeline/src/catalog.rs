//! Catalog backed by a helper program.
//!
//! The helper is invoked as `<args…> movie <id>`, `series <id>`,
//! `episode <id> <season> <episode>`, or `image <url>`. Records are read from
//! stdout as JSON; images are the raw stdout bytes.

use medley_metadata::{Catalog, CatalogResult};
use serde_json::Value;

use crate::error::PipelineError;
use crate::tool::{ExternalTool, ToolVars};

/// [`Catalog`] implementation that shells out to a configured program.
#[derive(Clone, Debug)]
pub struct CommandCatalog {
    tool: ExternalTool,
}

impl CommandCatalog {
    /// Wrap `tool`; output capture is always enabled.
    #[must_use]
    pub fn new(tool: ExternalTool) -> Self {
        Self {
            tool: tool.capturing(),
        }
    }

    fn query(&self, request: &[&str]) -> CatalogResult<Vec<u8>> {
        let extra: Vec<String> = request.iter().map(ToString::to_string).collect();
        Ok(self.tool.run(&ToolVars::new(), &extra)?.stdout)
    }

    fn query_record(&self, request: &[&str]) -> CatalogResult<Value> {
        let stdout = self.query(request)?;
        serde_json::from_slice(&stdout).map_err(|source| {
            PipelineError::ToolOutput {
                program: self.tool.program().to_string(),
                source,
            }
            .into()
        })
    }
}

impl Catalog for CommandCatalog {
    fn fetch_movie_info(&self, id: &str) -> CatalogResult<Value> {
        self.query_record(&["movie", id])
    }

    fn fetch_series_info(&self, id: &str) -> CatalogResult<Value> {
        self.query_record(&["series", id])
    }

    fn fetch_episode_info(&self, id: &str, season: u32, episode: u32) -> CatalogResult<Value> {
        let season = season.to_string();
        let episode = episode.to_string();
        self.query_record(&["episode", id, &season, &episode])
    }

    fn fetch_image(&self, url: &str) -> CatalogResult<Vec<u8>> {
        self.query(&["image", url])
    }
}
