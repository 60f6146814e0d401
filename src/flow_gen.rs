use std::time::Duration;

use flow_settings::{SettingsError, check_settings, merge_with_defaults};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::FlowError;
use crate::flow::{CompletedFlow, FlowInstance};
use crate::registry::{FlowDescriptor, FlowRegistry};

/// Turns a flow name plus settings into a prepared [`FlowInstance`].
pub struct FlowGraph<'a> {
    registry: &'a FlowRegistry,
    ctx: &'a ExecutionContext,
}

impl<'a> FlowGraph<'a> {
    pub fn new(registry: &'a FlowRegistry, ctx: &'a ExecutionContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &FlowRegistry {
        self.registry
    }

    pub fn descriptor(&self, flow_name: &str) -> Result<&'a FlowDescriptor, FlowError> {
        self.registry.resolve(flow_name)
    }

    /// Settings for `flow_name` after defaults are applied and validation
    /// passed. Every violation is reported, not only the first.
    pub fn resolve_settings(
        &self,
        descriptor: &FlowDescriptor,
        design: &JsonValue,
        flow_settings: &JsonValue,
    ) -> Result<JsonValue, FlowError> {
        let capabilities = descriptor.capabilities();
        let overrides = if flow_settings.is_null() {
            JsonValue::Object(Default::default())
        } else {
            flow_settings.clone()
        };
        let (merged, provenance) = merge_with_defaults(&capabilities.default_settings, &overrides);
        for entry in &provenance {
            debug!(flow = descriptor.name(), "{entry}");
        }

        let mut errors = Vec::new();
        if !merged.is_object() {
            errors.push(format!("settings must be a table, got `{merged}`"));
        } else {
            let required: Vec<&str> = capabilities
                .required_settings
                .iter()
                .map(String::as_str)
                .collect();
            match check_settings(&merged, &required, capabilities.schema.as_deref()) {
                Ok(()) => {}
                Err(SettingsError::Invalid { errors: found }) => errors.extend(found),
                Err(other) => return Err(other.into()),
            }
        }
        if capabilities.requires_testbench
            && design.get("tb").is_none_or(JsonValue::is_null)
        {
            errors.push(format!(
                "design `{}` has no `tb` section, which `{}` requires",
                design
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("<unnamed>"),
                descriptor.name()
            ));
        }

        if errors.is_empty() {
            Ok(merged)
        } else {
            Err(FlowError::SettingsInvalid {
                flow: descriptor.name().to_string(),
                errors,
            })
        }
    }

    /// Resolves, validates, instantiates and prepares `flow_name`.
    pub fn generate(
        &self,
        flow_name: &str,
        design: &JsonValue,
        flow_settings: &JsonValue,
        completed: Vec<CompletedFlow>,
    ) -> Result<FlowInstance, FlowError> {
        let descriptor = self.descriptor(flow_name)?;
        let settings = self.resolve_settings(descriptor, design, flow_settings)?;
        let capabilities = descriptor.capabilities();
        let timeout = settings
            .get("timeout")
            .and_then(JsonValue::as_u64)
            .unwrap_or(capabilities.timeout_seconds);

        let mut instance = FlowInstance::new(
            descriptor.name(),
            descriptor.instantiate(),
            settings,
            design.clone(),
            capabilities.requires_testbench,
            Duration::from_secs(timeout),
            completed,
        );
        instance.prepare(self.ctx)?;
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FlowRun, FlowState};
    use crate::registry::{Capabilities, FlowBody, FlowType};
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Default)]
    struct GateSim;

    impl FlowBody for GateSim {
        fn run(&mut self, _flow: &mut FlowRun<'_>) -> Result<(), FlowError> {
            Ok(())
        }
    }

    impl FlowType for GateSim {
        fn capabilities() -> Capabilities {
            Capabilities {
                requires_testbench: true,
                required_settings: vec!["vcd".to_string()],
                default_settings: json!({"optimize": true, "stop_time": 100}),
                schema: Some(
                    r#"{"type": "object", "properties": {"stop_time": {"type": "integer"}}}"#
                        .to_string(),
                ),
                ..Capabilities::default()
            }
        }
    }

    fn registry() -> FlowRegistry {
        let mut registry = FlowRegistry::new();
        registry.register::<GateSim>();
        registry
    }

    #[test]
    fn collects_every_violation() {
        let temp = TempDir::new().unwrap();
        let ctx = ExecutionContext::new(temp.path(), temp.path());
        let registry = registry();
        let graph = FlowGraph::new(&registry, &ctx);

        let err = graph
            .generate(
                "gate_sim",
                &json!({"name": "alu", "rtl": {"sources": []}}),
                &json!({"stop_time": "soon"}),
                Vec::new(),
            )
            .err()
            .unwrap();
        match err {
            FlowError::SettingsInvalid { flow, errors } => {
                assert_eq!(flow, "gate_sim");
                assert_eq!(errors.len(), 3, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("`vcd` is required")));
                assert!(errors.iter().any(|e| e.contains("`tb`")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn defaults_fill_in_and_instance_is_prepared() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("alu.v"), "module alu; endmodule\n").unwrap();
        std::fs::write(temp.path().join("alu_tb.v"), "module alu_tb; endmodule\n").unwrap();
        let ctx = ExecutionContext::new(temp.path().join("run"), temp.path());
        let registry = registry();
        let graph = FlowGraph::new(&registry, &ctx);

        let design = json!({
            "name": "alu",
            "rtl": {"sources": ["alu.v"]},
            "tb": {"sources": ["alu_tb.v"], "top": "alu_tb"},
        });
        let flow = graph
            .generate("GateSim", &design, &json!({"vcd": "dump.vcd", "timeout": 30}), Vec::new())
            .unwrap();
        assert_eq!(flow.name(), "gate_sim");
        assert_eq!(flow.state(), FlowState::Prepared);
        assert_eq!(flow.settings().get("optimize").and_then(|v| v.as_bool()), Some(true));
        assert!(flow.design().get("tb").is_some());
        assert!(flow.fingerprint().is_some());
    }

    #[test]
    fn unknown_flow_is_reported() {
        let temp = TempDir::new().unwrap();
        let ctx = ExecutionContext::new(temp.path(), temp.path());
        let registry = registry();
        let graph = FlowGraph::new(&registry, &ctx);
        assert!(matches!(
            graph.generate("yosys", &json!({}), &JsonValue::Null, Vec::new()),
            Err(FlowError::FlowNotFound { .. })
        ));
    }
}
