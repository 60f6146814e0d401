//! Regex extraction of named fields from tool report files.

use std::fs;
use std::path::Path;

use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::{Number, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::FlowError;
use crate::results::Results;

/// One required match: a single pattern, or alternatives tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatternGroup {
    One(String),
    AnyOf(Vec<String>),
}

impl PatternGroup {
    fn alternatives(&self) -> &[String] {
        match self {
            PatternGroup::One(pattern) => std::slice::from_ref(pattern),
            PatternGroup::AnyOf(patterns) => patterns,
        }
    }
}

impl From<&str> for PatternGroup {
    fn from(value: &str) -> Self {
        PatternGroup::One(value.to_string())
    }
}

/// Reads `report` once and matches every group against it, storing named
/// captures into `results`.
///
/// A missing report is not an error: a warning is logged and `Ok(false)` is
/// returned, since the usual cause is a tool run that already failed. A group
/// with no matching alternative is fatal.
pub fn extract(
    results: &mut Results,
    report: &Path,
    groups: &[PatternGroup],
    dotall: bool,
) -> Result<bool, FlowError> {
    if !report.exists() {
        warn!(
            "report {} does not exist; the tool run most probably failed",
            report.display()
        );
        return Ok(false);
    }
    let bytes = fs::read(report).map_err(|error| FlowError::io(report, error))?;
    let content = String::from_utf8_lossy(&bytes);

    for group in groups {
        let mut matched = false;
        for pattern in group.alternatives() {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .multi_line(true)
                .dot_matches_new_line(dotall)
                .build()
                .map_err(|error| FlowError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: error.to_string(),
                })?;
            let Some(caps) = regex.captures(&content) else {
                continue;
            };
            for name in regex.capture_names().flatten() {
                let value = caps
                    .name(name)
                    .map(|m| coerce(m.as_str()))
                    .unwrap_or(JsonValue::Null);
                debug!("{name}: {value}");
                results.insert(name.to_string(), value);
            }
            matched = true;
            break;
        }
        if !matched {
            let pattern = match group {
                PatternGroup::One(pattern) => pattern.clone(),
                PatternGroup::AnyOf(patterns) => patterns.join(" | "),
            };
            return Err(FlowError::ReportPatternNotMatched {
                pattern,
                report: report.to_path_buf(),
            });
        }
    }
    Ok(true)
}

/// Best-effort typing of a captured string.
pub fn coerce(raw: &str) -> JsonValue {
    let trimmed = raw.trim();
    let text = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);

    if let Ok(int) = text.parse::<i64>() {
        return JsonValue::Number(int.into());
    }
    if let Ok(float) = text.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return JsonValue::Number(number);
    }
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" => JsonValue::Bool(true),
        "false" | "no" => JsonValue::Bool(false),
        _ => JsonValue::String(text.to_string()),
    }
}
