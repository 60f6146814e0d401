#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value as JsonValue;
use tempfile::TempDir;

pub const STEP_BAR: &str = "==============";

pub fn step_line(name: &str) -> String {
    format!("{STEP_BAR}( {name} ){STEP_BAR}")
}

/// Writes an executable `#!/bin/sh` stub with the given body.
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    path
}

/// A scratch project: a design source, a project file and a stub tool.
pub struct Project {
    pub dir: TempDir,
    pub tool: PathBuf,
}

impl Project {
    pub fn new(project_toml: &str, tool_body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alu.v"), "module alu(input a, output y); assign y = a; endmodule\n")
            .unwrap();
        fs::write(dir.path().join("edaflow.toml"), project_toml).unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let tool = write_stub(&bin, "mytool", tool_body);
        Self { dir, tool }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn run_root(&self) -> PathBuf {
        self.path().join("run")
    }

    /// `edaflow` in the project directory with a hermetic environment.
    pub fn edaflow(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("edaflow");
        cmd.current_dir(self.path())
            .env("EDAFLOW_CONFIG", self.path().join("no-config.toml"))
            .env("EDAFLOW_BIN_MYTOOL", &self.tool)
            .env_remove("EDAFLOW_RUN_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn latest_results(&self, flow: &str) -> JsonValue {
        let path = self.run_root().join("Results").join(flow).join("results.json");
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    /// Fingerprint and flow run directory as reported by `edaflow fingerprint`.
    pub fn fingerprint(&self, flow: &str) -> (String, PathBuf) {
        let output = self
            .edaflow()
            .args(["fingerprint", flow, "--run-dir", "run", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let doc: JsonValue = serde_json::from_slice(&output.stdout).unwrap();
        (
            doc["fingerprint"].as_str().unwrap().to_string(),
            PathBuf::from(doc["run_dir"].as_str().unwrap()),
        )
    }
}

pub const SCRIPT_PROJECT: &str = r#"
[[design]]
name = "alu"

[design.rtl]
sources = ["alu.v"]
top = "alu"

[flows.script]
program = "mytool"
initial_step = "Setup"

[[flows.script.reports]]
file = "timing.rpt"
patterns = ['time:\s*(?P<time>[\d.]+)']
"#;
