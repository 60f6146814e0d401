//! A flow instance and its lifecycle:
//! `Created -> Prepared -> Running -> Succeeded | Failed`.
//!
//! `prepare` resolves design files, computes the fingerprint and fixes the
//! run directory. The settings are frozen from that point on; nothing on
//! [`FlowRun`] hands out mutable access to them.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use flow_settings::{DesignSource, FileResource, Value, fingerprint};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use crate::context::ExecutionContext;
use crate::error::FlowError;
use crate::process::{ExecutionReport, ProcessRunner, RunOptions};
use crate::registry::FlowBody;
use crate::report::{self, PatternGroup};
use crate::results::Results;
use crate::run_dir::RunDirectory;
use crate::util::json::dump_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Created,
    Prepared,
    Running,
    Succeeded,
    Failed,
}

impl FlowState {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowState::Created => "created",
            FlowState::Prepared => "prepared",
            FlowState::Running => "running",
            FlowState::Succeeded => "succeeded",
            FlowState::Failed => "failed",
        }
    }
}

/// Outcome of a finished flow, handed to dependent flows and the driver.
#[derive(Debug, Clone)]
pub struct CompletedFlow {
    pub name: String,
    pub fingerprint: String,
    pub dirs: RunDirectory,
    pub results: Results,
    pub succeeded: bool,
    /// Results came from an earlier run with the same fingerprint.
    pub reused: bool,
}

impl CompletedFlow {
    pub fn flow_run_dir(&self) -> &Path {
        self.dirs.flow_run_dir()
    }
}

pub struct FlowInstance {
    name: String,
    body: Box<dyn FlowBody>,
    requires_testbench: bool,
    timeout: Duration,
    raw_design: JsonValue,
    settings: Value,
    design: Value,
    state: FlowState,
    fingerprint: Option<String>,
    dirs: Option<RunDirectory>,
    results: Results,
    started: Option<Instant>,
    reused: bool,
    dependencies: Vec<CompletedFlow>,
}

impl FlowInstance {
    pub fn new(
        name: impl Into<String>,
        body: Box<dyn FlowBody>,
        settings: JsonValue,
        design: JsonValue,
        requires_testbench: bool,
        timeout: Duration,
        dependencies: Vec<CompletedFlow>,
    ) -> Self {
        Self {
            name: name.into(),
            body,
            requires_testbench,
            timeout,
            raw_design: design,
            settings: Value::from(settings),
            design: Value::Null,
            state: FlowState::Created,
            fingerprint: None,
            dirs: None,
            results: Results::new(),
            started: None,
            reused: false,
            dependencies,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    pub fn design(&self) -> &Value {
        &self.design
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn dirs(&self) -> Option<&RunDirectory> {
        self.dirs.as_ref()
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut Results {
        &mut self.results
    }

    pub fn dependencies(&self) -> &[CompletedFlow] {
        &self.dependencies
    }

    /// Wall time since the flow entered `Running`.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|started| started.elapsed())
    }

    fn expect_state(&self, expected: FlowState) -> Result<(), FlowError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FlowError::InvalidState {
                flow: self.name.clone(),
                expected: expected.as_str(),
                actual: self.state.as_str(),
            })
        }
    }

    fn prepared_dirs(&self) -> Result<&RunDirectory, FlowError> {
        self.dirs.as_ref().ok_or_else(|| FlowError::InvalidState {
            flow: self.name.clone(),
            expected: FlowState::Prepared.as_str(),
            actual: self.state.as_str(),
        })
    }

    pub fn prepare(&mut self, ctx: &ExecutionContext) -> Result<(), FlowError> {
        self.expect_state(FlowState::Created)?;

        let mut design = self.raw_design.clone();
        if !self.requires_testbench
            && let Some(map) = design.as_object_mut()
        {
            map.remove("tb");
        }
        self.design = resolve_design(&ctx.design_root, &design)?;

        let mut identity = Value::map();
        identity.insert("flow_name", Value::from(self.name.as_str()));
        identity.insert("flow", self.settings.clone());
        identity.insert("design", self.design.clone());
        let fingerprint = fingerprint(&identity)?;

        let dirs = RunDirectory::resolve(
            &ctx.run_root,
            &self.name,
            &fingerprint,
            ctx.options.force_run_dir.as_deref(),
        );
        debug!(
            flow = %self.name,
            %fingerprint,
            dir = %dirs.flow_run_dir().display(),
            "prepared"
        );
        self.fingerprint = Some(fingerprint);
        self.dirs = Some(dirs);
        self.state = FlowState::Prepared;
        Ok(())
    }

    /// Adopts the results of an earlier run with the same fingerprint
    /// instead of running the tool again.
    pub fn restore_cached(&mut self, results: Results) -> Result<(), FlowError> {
        self.expect_state(FlowState::Prepared)?;
        self.results = results;
        self.reused = true;
        self.state = FlowState::Succeeded;
        Ok(())
    }

    pub fn run(&mut self, ctx: &ExecutionContext) -> Result<(), FlowError> {
        self.expect_state(FlowState::Prepared)?;
        let dirs = self.prepared_dirs()?;
        if dirs.create()? {
            warn!(
                "Using existing run directory: {}",
                dirs.flow_run_dir().display()
            );
        }
        let dump = json!({
            "flow": self.settings.to_json(),
            "design": self.design.to_json(),
        });
        dump_json(&dump, &dirs.settings_path())?;

        info!("Running flow `{}` in {}", self.name, dirs.flow_run_dir().display());
        self.started = Some(Instant::now());
        self.state = FlowState::Running;

        let outcome = self.with_body(ctx, |body, run| body.run(run));
        if outcome.is_err() {
            self.fail();
        }
        outcome
    }

    /// Runs report extraction and settles the final state. Always leaves a
    /// `success` entry in the results.
    pub fn parse_reports(&mut self, ctx: &ExecutionContext) -> Result<bool, FlowError> {
        self.expect_state(FlowState::Running)?;
        let outcome = self.with_body(ctx, |body, run| body.parse_reports(run));
        let success = matches!(outcome, Ok(true));
        self.results.insert("success".to_string(), JsonValue::Bool(success));
        self.state = if success {
            FlowState::Succeeded
        } else {
            FlowState::Failed
        };
        outcome
    }

    /// Marks a running flow as failed after an error outside the body.
    pub fn fail(&mut self) {
        self.results
            .insert("success".to_string(), JsonValue::Bool(false));
        self.state = FlowState::Failed;
    }

    fn with_body<T>(
        &mut self,
        ctx: &ExecutionContext,
        f: impl FnOnce(&mut dyn FlowBody, &mut FlowRun<'_>) -> Result<T, FlowError>,
    ) -> Result<T, FlowError> {
        let Self {
            name,
            body,
            timeout,
            settings,
            design,
            state,
            dirs,
            results,
            dependencies,
            ..
        } = self;
        let Some(dirs) = dirs.as_ref() else {
            return Err(FlowError::InvalidState {
                flow: name.clone(),
                expected: FlowState::Prepared.as_str(),
                actual: state.as_str(),
            });
        };
        let mut run = FlowRun {
            ctx,
            name: name.as_str(),
            settings: &*settings,
            design: &*design,
            dirs,
            results,
            dependencies: dependencies.as_slice(),
            timeout: *timeout,
        };
        f(body.as_mut(), &mut run)
    }

    pub fn into_completed(self) -> Result<CompletedFlow, FlowError> {
        let succeeded = match self.state {
            FlowState::Succeeded => true,
            FlowState::Failed => false,
            other => {
                return Err(FlowError::InvalidState {
                    flow: self.name,
                    expected: "finished",
                    actual: other.as_str(),
                });
            }
        };
        let (Some(fingerprint), Some(dirs)) = (self.fingerprint, self.dirs) else {
            return Err(FlowError::InvalidState {
                flow: self.name,
                expected: FlowState::Prepared.as_str(),
                actual: FlowState::Created.as_str(),
            });
        };
        Ok(CompletedFlow {
            name: self.name,
            fingerprint,
            dirs,
            results: self.results,
            succeeded,
            reused: self.reused,
        })
    }
}

/// Converts `rtl`/`tb` source entries into [`DesignSource`]s and generics of
/// the form `{file: ...}` into [`FileResource`]s.
fn resolve_design(base: &Path, design: &JsonValue) -> Result<Value, FlowError> {
    let mut resolved = Value::from(design.clone());
    for section in ["rtl", "tb"] {
        let Some(raw) = design.get(section) else {
            continue;
        };
        let Some(target) = resolved.get_mut(section) else {
            continue;
        };
        if let Some(sources) = raw.get("sources").and_then(JsonValue::as_array) {
            let sources = sources
                .iter()
                .map(|entry| DesignSource::from_setting(base, entry).map(Value::from))
                .collect::<Result<Vec<_>, _>>()?;
            target.insert("sources", Value::Sequence(sources));
        }
        if let Some(generics) = raw.get("generics").and_then(JsonValue::as_object) {
            for (key, value) in generics {
                let Some(file) = value.get("file").and_then(JsonValue::as_str) else {
                    continue;
                };
                let resource = FileResource::resolve_in(base, file)?;
                if let Some(target_generics) = target.get_mut("generics") {
                    target_generics.insert(key.clone(), Value::from(resource));
                }
            }
        }
    }
    Ok(resolved)
}

/// What a [`FlowBody`] sees while it runs.
pub struct FlowRun<'a> {
    ctx: &'a ExecutionContext,
    name: &'a str,
    settings: &'a Value,
    design: &'a Value,
    dirs: &'a RunDirectory,
    results: &'a mut Results,
    dependencies: &'a [CompletedFlow],
    timeout: Duration,
}

impl<'a> FlowRun<'a> {
    pub fn context(&self) -> &ExecutionContext {
        self.ctx
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn settings(&self) -> &Value {
        self.settings
    }

    pub fn design(&self) -> &Value {
        self.design
    }

    pub fn flow_run_dir(&self) -> &Path {
        self.dirs.flow_run_dir()
    }

    pub fn reports_dir(&self) -> &Path {
        self.dirs.reports_dir()
    }

    pub fn results(&self) -> &Results {
        self.results
    }

    pub fn results_mut(&mut self) -> &mut Results {
        self.results
    }

    pub fn dependencies(&self) -> &[CompletedFlow] {
        self.dependencies
    }

    pub fn dependency(&self, name: &str) -> Option<&CompletedFlow> {
        self.dependencies.iter().find(|dep| dep.name == name)
    }

    pub fn nthreads(&self) -> u64 {
        self.settings
            .get("nthreads")
            .and_then(Value::as_u64)
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    /// Process options preloaded with this flow's timeout.
    pub fn process_options(&self) -> RunOptions {
        RunOptions {
            timeout: Some(self.timeout),
            ..RunOptions::default()
        }
    }

    /// Runs `program` inside the flow run directory.
    pub fn run_process<S: AsRef<OsStr>>(
        &self,
        program: &str,
        args: &[S],
        options: &RunOptions,
    ) -> Result<ExecutionReport, FlowError> {
        ProcessRunner::new(self.ctx, self.dirs.flow_run_dir()).run(program, args, options)
    }

    /// Extracts named fields from a report. Relative paths resolve against
    /// the reports directory.
    pub fn parse_report_regex(
        &mut self,
        report: impl AsRef<Path>,
        groups: &[PatternGroup],
    ) -> Result<bool, FlowError> {
        let path: PathBuf = if report.as_ref().is_absolute() {
            report.as_ref().to_path_buf()
        } else {
            self.dirs.reports_dir().join(report)
        };
        report::extract(self.results, &path, groups, true)
    }
}
