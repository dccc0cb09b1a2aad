//! Assessment tool catalog
//!
//! Served by `GET /tools`. The built-in catalog can be replaced with a JSON
//! array of tools via `TOOLS_FILE`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::types::LeadwayError;

/// Tool used when a submission doesn't name one
pub const DEFAULT_TOOL_ID: &str = "growth-assessment";

/// One assessment tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Site path the tool is served from
    pub path: String,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Configured tools
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolInfo>,
}

impl ToolCatalog {
    pub fn builtin() -> Self {
        Self {
            tools: vec![ToolInfo {
                id: DEFAULT_TOOL_ID.to_string(),
                name: "Growth Readiness Assessment".to_string(),
                description: "Score your online presence, lead generation, conversion and growth capacity, with a 90-day plan.".to_string(),
                path: "/tools/growth-assessment".to_string(),
                estimated_minutes: 5,
                active: true,
            }],
        }
    }

    pub fn new(tools: Vec<ToolInfo>) -> Result<Self, LeadwayError> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if tool.id.trim().is_empty() {
                return Err(LeadwayError::Config("Tool with empty id".into()));
            }
            if !seen.insert(tool.id.as_str()) {
                return Err(LeadwayError::Config(format!("Duplicate tool id '{}'", tool.id)));
            }
        }
        Ok(Self { tools })
    }

    /// Load a catalog from a JSON array on disk
    pub fn load(path: &Path) -> Result<Self, LeadwayError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LeadwayError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let tools: Vec<ToolInfo> = serde_json::from_str(&raw).map_err(|e| {
            LeadwayError::Config(format!("Invalid tools file {}: {}", path.display(), e))
        })?;

        let catalog = Self::new(tools)?;
        info!(path = %path.display(), count = catalog.tools.len(), "Loaded tool catalog");
        Ok(catalog)
    }

    /// Tools currently offered
    pub fn active(&self) -> Vec<&ToolInfo> {
        self.tools.iter().filter(|t| t.active).collect()
    }

    pub fn find_active(&self, id: &str) -> Option<&ToolInfo> {
        self.tools.iter().find(|t| t.active && t.id == id)
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
