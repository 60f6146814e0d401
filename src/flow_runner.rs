//! Top-level driver: prerequisites first, then the requested flow, with
//! skip-if-already-run on the fingerprinted run directory.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue, json};
use tracing::{debug, info};

use crate::context::ExecutionContext;
use crate::error::FlowError;
use crate::flow::{CompletedFlow, FlowInstance};
use crate::flow_gen::FlowGraph;
use crate::registry::FlowRegistry;
use crate::results::load_results;
use crate::util::json::dump_json;

pub struct FlowRunner<'a> {
    graph: FlowGraph<'a>,
    ctx: &'a ExecutionContext,
    design: JsonValue,
    flow_settings: Map<String, JsonValue>,
    completed: IndexMap<String, CompletedFlow>,
}

impl<'a> FlowRunner<'a> {
    pub fn new(
        registry: &'a FlowRegistry,
        ctx: &'a ExecutionContext,
        design: JsonValue,
        flow_settings: Map<String, JsonValue>,
    ) -> Self {
        Self {
            graph: FlowGraph::new(registry, ctx),
            ctx,
            design,
            flow_settings,
            completed: IndexMap::new(),
        }
    }

    /// Flows finished during this invocation, in completion order.
    pub fn completed(&self) -> impl Iterator<Item = &CompletedFlow> {
        self.completed.values()
    }

    fn settings_for(&self, canonical: &str, requested: &str) -> JsonValue {
        self.flow_settings
            .get(canonical)
            .or_else(|| self.flow_settings.get(requested))
            .cloned()
            .unwrap_or(JsonValue::Null)
    }

    /// Prepares `flow_name` without running anything, e.g. to report its
    /// fingerprint and run directory.
    pub fn prepare(&self, flow_name: &str) -> Result<FlowInstance, FlowError> {
        let canonical = self.graph.descriptor(flow_name)?.name().to_string();
        let settings = self.settings_for(&canonical, flow_name);
        self.graph
            .generate(&canonical, &self.design, &settings, Vec::new())
    }

    /// Runs `flow_name` and, before it, every prerequisite it declares.
    pub fn launch(&mut self, flow_name: &str) -> Result<CompletedFlow, FlowError> {
        let mut chain = Vec::new();
        self.launch_chain(flow_name, &mut chain)
    }

    fn launch_chain(
        &mut self,
        flow_name: &str,
        chain: &mut Vec<String>,
    ) -> Result<CompletedFlow, FlowError> {
        let descriptor = self.graph.descriptor(flow_name)?;
        let canonical = descriptor.name().to_string();
        if chain.contains(&canonical) {
            let mut cycle = chain.clone();
            cycle.push(canonical);
            return Err(FlowError::DependencyCycle { chain: cycle });
        }
        if let Some(done) = self.completed.get(&canonical) {
            debug!("`{canonical}` already completed in this invocation");
            return Ok(done.clone());
        }

        let settings = self.settings_for(&canonical, flow_name);
        let mut prerequisites = descriptor.capabilities().prerequisites.clone();
        if let Some(extra) = settings.get("dependencies").and_then(JsonValue::as_array) {
            prerequisites.extend(extra.iter().filter_map(JsonValue::as_str).map(str::to_string));
        }

        chain.push(canonical.clone());
        let mut dependencies = Vec::with_capacity(prerequisites.len());
        for prerequisite in &prerequisites {
            let done = self.launch_chain(prerequisite, chain)?;
            if !done.succeeded {
                return Err(FlowError::DependencyFailed {
                    flow: canonical,
                    dependency: done.name,
                });
            }
            dependencies.push(done);
        }
        chain.pop();

        let mut instance =
            self.graph
                .generate(&canonical, &self.design, &settings, dependencies)?;
        let outcome = self.execute(&mut instance);
        let completed = instance.into_completed()?;
        self.completed.insert(canonical, completed.clone());
        outcome.map(|()| completed)
    }

    fn execute(&self, instance: &mut FlowInstance) -> Result<(), FlowError> {
        let dirs = instance
            .dirs()
            .cloned()
            .ok_or_else(|| FlowError::InvalidState {
                flow: instance.name().to_string(),
                expected: "prepared",
                actual: instance.state().as_str(),
            })?;

        // A forced run directory is shared across fingerprints, so the cached
        // fingerprint has to match too.
        if !self.ctx.options.force
            && let Some(cached) = load_results(&dirs.results_path())
            && cached.get("success") == Some(&JsonValue::Bool(true))
            && cached.get("fingerprint").and_then(JsonValue::as_str) == instance.fingerprint()
        {
            info!(
                "Flow `{}` already ran with identical settings; reusing {}",
                instance.name(),
                dirs.flow_run_dir().display()
            );
            instance.restore_cached(cached)?;
            return dump_json(instance.results(), &dirs.latest_results_path());
        }

        let outcome = instance
            .run(self.ctx)
            .and_then(|()| instance.parse_reports(self.ctx).map(|_| ()));
        if outcome.is_err() {
            instance.fail();
        }

        let runtime_minutes = instance
            .elapsed()
            .map(|elapsed| elapsed.as_secs_f64() / 60.0)
            .unwrap_or_default();
        let design_name = self.design.get("name").cloned().unwrap_or(JsonValue::Null);
        let name = instance.name().to_string();
        let fingerprint = instance.fingerprint().map(str::to_string);
        let results = instance.results_mut();
        results.insert("design".to_string(), design_name);
        results.insert("flow".to_string(), json!(name));
        results.insert("fingerprint".to_string(), json!(fingerprint));
        results.insert("runtime_minutes".to_string(), json!(runtime_minutes));
        if !results.contains_key("success") {
            results.insert("success".to_string(), JsonValue::Bool(false));
        }

        if dirs.flow_run_dir().is_dir() {
            dump_json(instance.results(), &dirs.results_path())?;
            dump_json(instance.results(), &dirs.latest_results_path())?;
            info!("Results written to {}", dirs.results_path().display());
        }
        outcome
    }
}
