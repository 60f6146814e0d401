use std::any::type_name;
use std::fmt;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use crate::error::FlowError;
use crate::flow::FlowRun;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 2 * 60 * 60;

/// What a flow type needs from its inputs and how long it may take.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub requires_testbench: bool,
    pub required_settings: Vec<String>,
    pub default_settings: JsonValue,
    /// JSON schema the merged flow settings must satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub timeout_seconds: u64,
    /// Flows that must complete before this one starts.
    pub prerequisites: Vec<String>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            requires_testbench: false,
            required_settings: Vec::new(),
            default_settings: json!({}),
            schema: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            prerequisites: Vec::new(),
        }
    }
}

/// The tool-specific part of a flow.
pub trait FlowBody: Send {
    /// Drives the external tool inside the flow run directory.
    fn run(&mut self, flow: &mut FlowRun<'_>) -> Result<(), FlowError>;

    /// Turns tool reports into results. Returns the overall success.
    fn parse_reports(&mut self, flow: &mut FlowRun<'_>) -> Result<bool, FlowError> {
        let _ = flow;
        Ok(true)
    }
}

/// A registrable flow. The flow name is the snake_case form of the type name.
pub trait FlowType: FlowBody + Default + 'static {
    fn capabilities() -> Capabilities;
}

pub struct FlowDescriptor {
    name: String,
    type_ident: &'static str,
    capabilities: Capabilities,
    factory: fn() -> Box<dyn FlowBody>,
}

impl FlowDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn instantiate(&self) -> Box<dyn FlowBody> {
        (self.factory)()
    }
}

impl fmt::Debug for FlowDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDescriptor")
            .field("name", &self.name)
            .field("type", &self.type_ident)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

fn construct<T: FlowType>() -> Box<dyn FlowBody> {
    Box::new(T::default())
}

fn type_ident<T>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Explicit name -> flow type table, filled once at startup.
#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: IndexMap<String, FlowDescriptor>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a built-in flow under its own name. Registering the same
    /// type twice keeps the first descriptor.
    pub fn register<T: FlowType>(&mut self) -> &mut Self {
        let ident = type_ident::<T>();
        self.insert::<T>(ident.to_case(Case::Snake), ident)
    }

    /// Registers a flow contributed from outside the built-in set as
    /// `<namespace>.<name>`.
    pub fn register_external<T: FlowType>(&mut self, namespace: &str) -> &mut Self {
        let ident = type_ident::<T>();
        let name = format!("{namespace}.{}", ident.to_case(Case::Snake));
        self.insert::<T>(name, ident)
    }

    fn insert<T: FlowType>(&mut self, name: String, type_ident: &'static str) -> &mut Self {
        if self.flows.contains_key(&name) {
            tracing::warn!("flow `{name}` is already registered");
            return self;
        }
        let descriptor = FlowDescriptor {
            name: name.clone(),
            type_ident,
            capabilities: T::capabilities(),
            factory: construct::<T>,
        };
        self.flows.insert(name, descriptor);
        self
    }

    /// Looks `name` up directly, then by the PascalCase type name derived from
    /// it (so `VivadoSynth` and `vivado-synth` both find `vivado_synth`).
    pub fn resolve(&self, name: &str) -> Result<&FlowDescriptor, FlowError> {
        if let Some(descriptor) = self.flows.get(name) {
            return Ok(descriptor);
        }
        let (namespace, base) = match name.rsplit_once('.') {
            Some((namespace, base)) => (Some(namespace), base),
            None => (None, name),
        };
        let wanted = base.to_case(Case::Pascal);
        self.flows
            .values()
            .find(|descriptor| {
                let same_namespace = match namespace {
                    Some(namespace) => descriptor
                        .name
                        .strip_suffix(&format!(".{}", wanted.to_case(Case::Snake)))
                        == Some(namespace),
                    None => !descriptor.name.contains('.'),
                };
                same_namespace && descriptor.type_ident == wanted
            })
            .ok_or_else(|| FlowError::FlowNotFound {
                name: name.to_string(),
                known: self.names().map(str::to_string).collect(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FlowDescriptor> {
        self.flows.values()
    }
}
