//! `script`: runs an arbitrary tool command and scrapes its reports.
//!
//! ```toml
//! [flows.script]
//! program = "yosys"
//! args = ["-c", "synth.tcl"]
//! initial_step = "Synthesis"
//!
//! [[flows.script.reports]]
//! file = "utilization.rpt"
//! patterns = ['LUTs:\s*(?P<lut>\d+)', ['Fmax:\s*(?P<fmax>[\d.]+)', 'slack:\s*(?P<slack>-?[\d.]+)']]
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};

use crate::error::FlowError;
use crate::flow::FlowRun;
use crate::registry::{Capabilities, FlowBody, FlowType};
use crate::report::PatternGroup;

const SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "program": {"type": "string", "minLength": 1},
    "args": {"type": "array", "items": {"type": ["string", "number", "boolean"]}},
    "check": {"type": "boolean"},
    "echo": {"type": "boolean"},
    "log_file": {"type": "string"},
    "initial_step": {"type": "string"},
    "nthreads": {"type": "integer", "minimum": 1},
    "timeout": {"type": "integer", "minimum": 1},
    "dependencies": {"type": "array", "items": {"type": "string"}},
    "reports": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["file", "patterns"],
        "properties": {
          "file": {"type": "string"},
          "patterns": {
            "type": "array",
            "items": {"anyOf": [
              {"type": "string"},
              {"type": "array", "items": {"type": "string"}, "minItems": 1}
            ]}
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Clone, Deserialize)]
struct ScriptSettings {
    program: String,
    #[serde(default)]
    args: Vec<JsonValue>,
    #[serde(default = "default_check")]
    check: bool,
    #[serde(default)]
    echo: bool,
    log_file: Option<PathBuf>,
    initial_step: Option<String>,
    #[serde(default)]
    reports: Vec<ReportSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReportSpec {
    file: PathBuf,
    patterns: Vec<PatternGroup>,
}

fn default_check() -> bool {
    true
}

#[derive(Debug, Default)]
pub struct Script {
    settings: Option<ScriptSettings>,
    exit_ok: bool,
}

impl Script {
    fn settings(flow: &FlowRun<'_>) -> Result<ScriptSettings, FlowError> {
        serde_json::from_value(flow.settings().to_json()).map_err(|error| {
            FlowError::SettingsInvalid {
                flow: flow.name().to_string(),
                errors: vec![error.to_string()],
            }
        })
    }
}

fn env_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

impl FlowBody for Script {
    fn run(&mut self, flow: &mut FlowRun<'_>) -> Result<(), FlowError> {
        let settings = Self::settings(flow)?;
        let args: Vec<String> = settings
            .args
            .iter()
            .map(|arg| match arg {
                JsonValue::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect();

        let mut options = flow.process_options();
        options.check = settings.check;
        options.echo = settings.echo;
        options.log_file = settings.log_file.clone();
        options.initial_step = settings.initial_step.clone();
        options.env.push((
            "EDAFLOW_REPORTS_DIR".to_string(),
            flow.reports_dir().display().to_string(),
        ));
        options
            .env
            .push(("EDAFLOW_NTHREADS".to_string(), flow.nthreads().to_string()));

        let mut dependencies = Map::new();
        for dep in flow.dependencies() {
            options.env.push((
                format!("EDAFLOW_DEP_{}_DIR", env_key(&dep.name)),
                dep.flow_run_dir().display().to_string(),
            ));
            dependencies.insert(
                dep.name.clone(),
                json!({
                    "success": dep.succeeded,
                    "fingerprint": dep.fingerprint,
                    "run_dir": dep.flow_run_dir().display().to_string(),
                }),
            );
        }

        let report = flow.run_process(&settings.program, &args, &options)?;
        self.exit_ok = report.is_success();

        let results = flow.results_mut();
        results.insert("exit_code".to_string(), json!(report.exit_code));
        results.insert("steps".to_string(), json!(report.steps));
        results.insert("tool_errors".to_string(), json!(report.errors));
        results.insert(
            "tool_critical_warnings".to_string(),
            json!(report.critical_warnings),
        );
        results.insert("tool_warnings".to_string(), json!(report.warnings));
        if !dependencies.is_empty() {
            results.insert("dependencies".to_string(), JsonValue::Object(dependencies));
        }
        self.settings = Some(settings);
        Ok(())
    }

    fn parse_reports(&mut self, flow: &mut FlowRun<'_>) -> Result<bool, FlowError> {
        let mut success = self.exit_ok;
        let reports = self
            .settings
            .as_ref()
            .map(|settings| settings.reports.clone())
            .unwrap_or_default();
        for spec in &reports {
            let extracted = flow.parse_report_regex(&spec.file, &spec.patterns)?;
            success = success && extracted;
        }
        Ok(success)
    }
}

impl FlowType for Script {
    fn capabilities() -> Capabilities {
        Capabilities {
            required_settings: vec!["program".to_string()],
            default_settings: json!({
                "args": [],
                "check": true,
                "echo": false,
                "nthreads": 1,
                "reports": [],
            }),
            schema: Some(SCHEMA.to_string()),
            ..Capabilities::default()
        }
    }
}
