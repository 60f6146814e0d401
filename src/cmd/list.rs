use anyhow::Result;
use serde_json::json;

use crate::cli::ListArgs;
use crate::flows::builtin_registry;

pub fn run(args: &ListArgs) -> Result<()> {
    let registry = builtin_registry();
    if args.json {
        let flows: Vec<_> = registry
            .descriptors()
            .map(|descriptor| {
                json!({
                    "name": descriptor.name(),
                    "capabilities": descriptor.capabilities(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&flows)?);
        return Ok(());
    }

    for descriptor in registry.descriptors() {
        let caps = descriptor.capabilities();
        println!("{}", descriptor.name());
        println!(
            "  requires testbench: {}",
            if caps.requires_testbench { "yes" } else { "no" }
        );
        if !caps.required_settings.is_empty() {
            println!("  required settings:  {}", caps.required_settings.join(", "));
        }
        if !caps.prerequisites.is_empty() {
            println!("  prerequisites:      {}", caps.prerequisites.join(", "));
        }
        println!("  timeout:            {}s", caps.timeout_seconds);
    }
    Ok(())
}
