use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::FlowError;

/// Resolves the executable for `name`: `EDAFLOW_BIN_<NAME>` env override,
/// then the user config, then PATH. Names that already contain a path are
/// used as given. An unresolved bare name is returned unchanged so the spawn
/// itself reports the missing executable.
pub fn resolve_program(name: &str, tools: &HashMap<String, PathBuf>) -> Result<PathBuf, FlowError> {
    if Path::new(name).components().count() > 1 {
        return Ok(PathBuf::from(name));
    }

    let env_key = format!(
        "EDAFLOW_BIN_{}",
        name.replace(['-', '.'], "_").to_uppercase()
    );
    if let Some(path) = env::var_os(&env_key) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        return Err(FlowError::ExecutableNotFound {
            program: format!("{} (from {env_key})", path.display()),
        });
    }

    if let Some(path) = tools.get(name) {
        if path.exists() {
            return Ok(path.clone());
        }
        return Err(FlowError::ExecutableNotFound {
            program: format!("{} (configured for {name})", path.display()),
        });
    }

    Ok(which::which(name).unwrap_or_else(|_| PathBuf::from(name)))
}
