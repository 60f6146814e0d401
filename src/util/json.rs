use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::FlowError;

/// Writes `value` as pretty JSON. An existing file is first renamed to
/// `<stem>.backup_<mtime>.json` so earlier runs stay inspectable.
pub fn dump_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), FlowError> {
    if path.exists() {
        let backup = backup_path(path)?;
        tracing::debug!(from = %path.display(), to = %backup.display(), "backing up");
        fs::rename(path, &backup).map_err(|error| FlowError::io(path, error))?;
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|error| FlowError::io(parent, error))?;
    }
    let rendered = serde_json::to_string_pretty(value).map_err(|error| FlowError::Json {
        path: path.to_path_buf(),
        error,
    })?;
    fs::write(path, rendered + "\n").map_err(|error| FlowError::io(path, error))
}

pub fn load_json(path: &Path) -> Result<Value, FlowError> {
    let raw = fs::read_to_string(path).map_err(|error| FlowError::io(path, error))?;
    serde_json::from_str(&raw).map_err(|error| FlowError::Json {
        path: path.to_path_buf(),
        error,
    })
}

fn backup_path(path: &Path) -> Result<PathBuf, FlowError> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|error| FlowError::io(path, error))?;
    let stamp = OffsetDateTime::from(modified)
        .format(format_description!(
            "[year]-[month]-[day]-[hour][minute][second]"
        ))
        .unwrap_or_else(|_| "unknown".to_string());
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut candidate = path.with_file_name(format!("{stem}.backup_{stamp}.json"));
    let mut counter = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{stem}.backup_{stamp}_{counter}.json"));
        counter += 1;
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn second_dump_keeps_a_backup() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        dump_json(&json!({"round": 1}), &path).unwrap();
        dump_json(&json!({"round": 2}), &path).unwrap();

        assert_eq!(load_json(&path).unwrap(), json!({"round": 2}));
        let backups: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("settings.backup_"))
            .collect();
        assert_eq!(backups.len(), 1);
        let backup = temp.path().join(&backups[0]);
        assert_eq!(load_json(&backup).unwrap(), json!({"round": 1}));
    }

    #[test]
    fn creates_missing_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Results").join("script").join("results.json");
        dump_json(&json!({"success": true}), &path).unwrap();
        assert!(path.exists());
    }
}
