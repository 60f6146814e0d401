//! Deterministic on-disk locations for flow runs.
//!
//! ```text
//! <run_root>/
//!   .run/<fingerprint>/<flow>/          flow run directory (hash keyed)
//!   .run/<fingerprint>/<flow>/reports/  tool reports
//!   Results/<flow>/                     latest results, not hash keyed
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FlowError;

pub const RUN_SUBDIR: &str = ".run";
pub const RESULTS_SUBDIR: &str = "Results";
pub const REPORTS_SUBDIR: &str = "reports";
pub const SETTINGS_FILE: &str = "settings.json";
pub const RESULTS_FILE: &str = "results.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    run_path: PathBuf,
    flow_run_dir: PathBuf,
    reports_dir: PathBuf,
    results_dir: PathBuf,
}

impl RunDirectory {
    /// Pure path derivation; nothing is touched on disk. A forced path
    /// replaces `<run_root>/.run/<fingerprint>` verbatim.
    pub fn resolve(
        run_root: &Path,
        flow_name: &str,
        fingerprint: &str,
        forced: Option<&Path>,
    ) -> Self {
        let run_path = match forced {
            Some(path) => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            None => run_root.join(RUN_SUBDIR).join(fingerprint),
        };
        let flow_run_dir = run_path.join(flow_name);
        let reports_dir = flow_run_dir.join(REPORTS_SUBDIR);
        let results_dir = run_root.join(RESULTS_SUBDIR).join(flow_name);
        Self {
            run_path,
            flow_run_dir,
            reports_dir,
            results_dir,
        }
    }

    /// Creates the flow run directory and its reports directory if absent.
    /// Returns `true` when the flow run directory already existed; existing
    /// contents are left in place.
    pub fn create(&self) -> Result<bool, FlowError> {
        let existed = self.flow_run_dir.is_dir();
        fs::create_dir_all(&self.reports_dir)
            .map_err(|error| FlowError::io(&self.reports_dir, error))?;
        Ok(existed)
    }

    pub fn run_path(&self) -> &Path {
        &self.run_path
    }

    pub fn flow_run_dir(&self) -> &Path {
        &self.flow_run_dir
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.flow_run_dir.join(SETTINGS_FILE)
    }

    pub fn results_path(&self) -> PathBuf {
        self.flow_run_dir.join(RESULTS_FILE)
    }

    pub fn latest_results_path(&self) -> PathBuf {
        self.results_dir.join(RESULTS_FILE)
    }
}
