use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value as JsonValue};

use crate::error::FlowError;

/// Project files looked up in the working directory, in order.
pub const PROJECT_FILES: [&str; 4] = ["edaflow.toml", "edaflow.json", "edaflow.yaml", "edaflow.yml"];
pub const RUN_DIR_ENV: &str = "EDAFLOW_RUN_DIR";
pub const DEFAULT_RUN_DIR: &str = "edaflow_run";

/// A project file: designs, per-flow settings and an optional run root.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    designs: Vec<JsonValue>,
    flows: Map<String, JsonValue>,
    run_dir: Option<PathBuf>,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read project file {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let doc: JsonValue = match extension.as_str() {
            "toml" => toml::from_str(&raw)
                .with_context(|| format!("failed to parse {} as TOML", path.display()))?,
            "json" => serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {} as JSON", path.display()))?,
            "yaml" | "yml" => serde_yaml_bw::from_str(&raw)
                .with_context(|| format!("failed to parse {} as YAML", path.display()))?,
            other => bail!(
                "unsupported project file type `{other}` for {}",
                path.display()
            ),
        };
        let root = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let root = fs::canonicalize(&root)
            .with_context(|| format!("failed to resolve {}", root.display()))?;
        Self::from_document(root, doc)
    }

    /// First of [`PROJECT_FILES`] found in `dir`.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        for name in PROJECT_FILES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                tracing::debug!("using project file {}", candidate.display());
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    pub fn from_document(root: PathBuf, doc: JsonValue) -> Result<Self> {
        let JsonValue::Object(mut doc) = doc else {
            bail!("project file must contain a table at the top level");
        };
        let designs = match doc.remove("design") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items,
            Some(single @ JsonValue::Object(_)) => vec![single],
            Some(other) => bail!("`design` must be a table or a list of tables, got `{other}`"),
        };
        for design in &designs {
            if !design.is_object() {
                bail!("every `design` entry must be a table, got `{design}`");
            }
        }
        let flows = match doc.remove("flows") {
            None | Some(JsonValue::Null) => Map::new(),
            Some(JsonValue::Object(flows)) => flows,
            Some(other) => bail!("`flows` must be a table, got `{other}`"),
        };
        let run_dir = doc
            .get("run_dir")
            .or_else(|| doc.get("project").and_then(|project| project.get("run_dir")))
            .and_then(JsonValue::as_str)
            .map(|dir| root.join(dir));
        Ok(Self {
            root,
            designs,
            flows,
            run_dir,
        })
    }

    /// Directory relative design paths resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    pub fn flows(&self) -> &Map<String, JsonValue> {
        &self.flows
    }

    pub fn design_names(&self) -> Vec<String> {
        self.designs
            .iter()
            .enumerate()
            .map(|(index, design)| {
                design
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{index}"))
            })
            .collect()
    }

    /// The design named `name`, or the only design when `name` is omitted.
    /// A project without designs yields an empty design.
    pub fn select_design(&self, name: Option<&str>) -> Result<JsonValue, FlowError> {
        let names = self.design_names();
        match name {
            Some(wanted) => names
                .iter()
                .position(|candidate| candidate == wanted)
                .map(|index| self.designs[index].clone())
                .ok_or_else(|| FlowError::DesignNotFound {
                    name: wanted.to_string(),
                    available: names.clone(),
                }),
            None => match self.designs.as_slice() {
                [] => Ok(JsonValue::Object(Map::new())),
                [only] => Ok(only.clone()),
                _ => Err(FlowError::DesignAmbiguous { available: names }),
            },
        }
    }

    /// Applies a `flow.key.sub=value` override. The value is parsed as JSON
    /// and kept as a plain string when that fails.
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let Some((path, raw)) = assignment.split_once('=') else {
            bail!("override `{assignment}` must look like flow.key=value");
        };
        let mut segments = path.split('.').map(str::trim).filter(|s| !s.is_empty());
        let Some(flow) = segments.next() else {
            bail!("override `{assignment}` does not name a flow");
        };
        let keys: Vec<&str> = segments.collect();
        if keys.is_empty() {
            bail!("override `{assignment}` does not name a setting");
        }
        let mut value = serde_json::from_str::<JsonValue>(raw.trim())
            .unwrap_or_else(|_| JsonValue::String(raw.to_string()));
        for key in keys.iter().rev() {
            let mut wrapper = Map::new();
            wrapper.insert(key.to_string(), value);
            value = JsonValue::Object(wrapper);
        }
        let target = self.flows.entry(flow.to_string()).or_insert(JsonValue::Null);
        merge_into(target, value);
        Ok(())
    }
}

fn merge_into(target: &mut JsonValue, patch: JsonValue) {
    match (target, patch) {
        (JsonValue::Object(existing), JsonValue::Object(patch)) => {
            for (key, value) in patch {
                merge_into(existing.entry(key).or_insert(JsonValue::Null), value);
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Run root: CLI flag, project file, `EDAFLOW_RUN_DIR`, user config default,
/// then `./edaflow_run`. The directory is created and returned absolute.
pub fn resolve_run_root(
    cli: Option<&Path>,
    project: Option<&Project>,
    config_default: Option<&Path>,
) -> Result<PathBuf> {
    let chosen = cli
        .map(Path::to_path_buf)
        .or_else(|| project.and_then(Project::run_dir).map(Path::to_path_buf))
        .or_else(|| env::var_os(RUN_DIR_ENV).map(PathBuf::from))
        .or_else(|| config_default.map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_DIR));
    fs::create_dir_all(&chosen)
        .with_context(|| format!("failed to create run directory {}", chosen.display()))?;
    fs::canonicalize(&chosen)
        .with_context(|| format!("failed to resolve run directory {}", chosen.display()))
}
