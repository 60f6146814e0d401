//! Flows that ship with the engine.

pub mod script;

use crate::registry::FlowRegistry;

pub use script::Script;

pub fn builtin_registry() -> FlowRegistry {
    let mut registry = FlowRegistry::new();
    registry.register::<Script>();
    registry
}
