use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

#[test]
fn list_shows_builtin_flows() {
    let mut cmd = cargo_bin_cmd!("edaflow");
    cmd.arg("list")
        .assert()
        .success()
        .stdout(contains("script").and(contains("required settings:  program")));
}

#[test]
fn list_json_carries_capabilities() {
    let mut cmd = cargo_bin_cmd!("edaflow");
    let output = cmd.args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let flows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let script = flows
        .as_array()
        .unwrap()
        .iter()
        .find(|flow| flow["name"] == "script")
        .unwrap();
    assert_eq!(script["capabilities"]["timeout_seconds"], 7200);
    assert_eq!(script["capabilities"]["requires_testbench"], false);
}

#[test]
fn unknown_flow_lists_the_known_ones() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("edaflow");
    cmd.current_dir(temp.path())
        .env("EDAFLOW_CONFIG", temp.path().join("none.toml"))
        .args(["run", "vivado_synth", "--run-dir", "run"])
        .assert()
        .failure()
        .stderr(contains("not registered").and(contains("script")));
}
