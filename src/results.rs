use std::path::Path;

use colored::Colorize;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::util::json::load_json;

/// Ordered results of one flow run.
pub type Results = IndexMap<String, JsonValue>;

const NAME_WIDTH: usize = 48;
const DATA_WIDTH: usize = 32;

/// Two-column summary. Null values and keys starting with `_` are skipped.
pub fn render_table(results: &Results) -> String {
    let hline = "-".repeat(NAME_WIDTH + DATA_WIDTH);
    let mut out = String::new();
    out.push('\n');
    out.push_str(&hline);
    out.push('\n');
    out.push_str(&format!("{:^width$}\n", "Results", width = NAME_WIDTH + DATA_WIDTH));
    out.push_str(&hline);
    out.push('\n');
    for (key, value) in results {
        if value.is_null() || key.starts_with('_') {
            continue;
        }
        let cell = match value {
            JsonValue::Number(number) if number.is_f64() => {
                format!("{:>DATA_WIDTH$.3}", number.as_f64().unwrap_or_default())
            }
            JsonValue::Number(number) => format!("{number:>DATA_WIDTH$}"),
            JsonValue::Bool(flag) => {
                let pad = " ".repeat(DATA_WIDTH - 1);
                let mark = if *flag { "✓".green() } else { "✗".red() };
                format!("{pad}{mark}")
            }
            JsonValue::Array(items) => {
                let joined = items.iter().map(plain).collect::<Vec<_>>().join(" ");
                format!("{joined:<DATA_WIDTH$}")
            }
            other => format!("{:>DATA_WIDTH$}", plain(other)),
        };
        out.push_str(&format!("{key:<NAME_WIDTH$}{cell}\n"));
    }
    out.push_str(&hline);
    out.push('\n');
    out
}

pub fn print_results(results: &Results) {
    println!("{}", render_table(results));
}

/// Cached results from an earlier run, if the file exists and holds an
/// object.
pub fn load_results(path: &Path) -> Option<Results> {
    if !path.is_file() {
        return None;
    }
    match load_json(path) {
        Ok(JsonValue::Object(map)) => Some(map.into_iter().collect()),
        Ok(_) => None,
        Err(error) => {
            tracing::warn!("ignoring unreadable results: {error}");
            None
        }
    }
}

fn plain(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}
