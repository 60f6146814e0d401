use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct EdaflowConfig {
    /// Map of tool name -> executable override.
    #[serde(default)]
    pub tools: HashMap<String, ToolEntry>,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToolEntry {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefaultsSection {
    /// Run root used when neither the CLI nor the project names one.
    pub run_dir: Option<PathBuf>,
}

impl EdaflowConfig {
    pub fn tool_paths(&self) -> HashMap<String, PathBuf> {
        self.tools
            .iter()
            .filter_map(|(name, entry)| entry.path.clone().map(|path| (name.clone(), path)))
            .collect()
    }
}

pub fn load() -> Result<EdaflowConfig> {
    let path_override = std::env::var("EDAFLOW_CONFIG").ok();
    load_from(path_override.as_deref())
}

pub fn load_from(path_override: Option<&str>) -> Result<EdaflowConfig> {
    let Some(path) = path_override.map(PathBuf::from).or_else(config_path) else {
        return Ok(EdaflowConfig::default());
    };

    if !path.exists() {
        return Ok(EdaflowConfig::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: EdaflowConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    Ok(config)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut dir| {
        dir.push("edaflow");
        dir.push("config.toml");
        dir
    })
}
