use std::collections::HashSet;

use serde_json::{Map, Value as JsonValue};

/// Overlays `overrides` on `defaults`, recursing into objects. Returns the
/// merged tree and a log of `default: <path>` / `override: <path>` entries
/// describing where each leaf came from.
pub fn merge_with_defaults(defaults: &JsonValue, overrides: &JsonValue) -> (JsonValue, Vec<String>) {
    let mut run_log = Vec::new();
    let mut path = Vec::new();
    let resolved = merge_node(Some(defaults), overrides, &mut path, &mut run_log);

    let mut seen = HashSet::new();
    run_log.retain(|entry| seen.insert(entry.clone()));

    (resolved, run_log)
}

fn merge_node(
    defaults: Option<&JsonValue>,
    overrides: &JsonValue,
    path: &mut Vec<String>,
    run_log: &mut Vec<String>,
) -> JsonValue {
    match (defaults, overrides) {
        (Some(JsonValue::Object(default_map)), JsonValue::Object(override_map)) => {
            let mut result = Map::new();

            for (key, default_value) in default_map {
                path.push(key.clone());
                if let Some(override_value) = override_map.get(key) {
                    let merged = merge_node(Some(default_value), override_value, path, run_log);
                    result.insert(key.clone(), merged);
                } else {
                    log_entry("default", path, run_log);
                    result.insert(key.clone(), default_value.clone());
                }
                path.pop();
            }

            for (key, override_value) in override_map {
                if default_map.contains_key(key) {
                    continue;
                }
                path.push(key.clone());
                log_entry("override", path, run_log);
                result.insert(key.clone(), override_value.clone());
                path.pop();
            }

            JsonValue::Object(result)
        }
        (Some(JsonValue::Object(default_map)), JsonValue::Null) => {
            JsonValue::Object(default_map.clone())
        }
        (Some(default_value), override_value) => {
            let kind = if default_value == override_value {
                "default"
            } else {
                "override"
            };
            log_entry(kind, path, run_log);
            override_value.clone()
        }
        (None, override_value) => {
            log_entry("override", path, run_log);
            override_value.clone()
        }
    }
}

fn log_entry(kind: &str, path: &[String], run_log: &mut Vec<String>) {
    if !path.is_empty() {
        run_log.push(format!("{kind}: {}", path.join(".")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_win_and_defaults_fill_gaps() {
        let defaults = json!({"nthreads": 1, "opt": {"level": 2, "effort": "high"}});
        let overrides = json!({"opt": {"level": 3}, "clock_period": 4.0});
        let (merged, log) = merge_with_defaults(&defaults, &overrides);

        assert_eq!(
            merged,
            json!({"nthreads": 1, "opt": {"level": 3, "effort": "high"}, "clock_period": 4.0})
        );
        assert!(log.contains(&"default: nthreads".to_string()));
        assert!(log.contains(&"override: opt.level".to_string()));
        assert!(log.contains(&"default: opt.effort".to_string()));
        assert!(log.contains(&"override: clock_period".to_string()));
    }

    #[test]
    fn null_overrides_keep_defaults() {
        let defaults = json!({"nthreads": 1});
        let (merged, _) = merge_with_defaults(&defaults, &JsonValue::Null);
        assert_eq!(merged, defaults);
    }
}
