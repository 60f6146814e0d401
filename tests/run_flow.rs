#![cfg(unix)]

mod support;

use std::fs;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::json;

use support::{Project, SCRIPT_PROJECT, step_line};

fn reporting_tool() -> String {
    format!(
        "echo '{}'\necho 'reading alu.v'\necho 'time: 12.5' > \"$EDAFLOW_REPORTS_DIR/timing.rpt\"\necho '{}'\necho 'done'",
        step_line("synth"),
        step_line("report")
    )
}

#[test]
fn script_flow_runs_and_extracts_reports() {
    let project = Project::new(SCRIPT_PROJECT, &reporting_tool());

    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .success()
        .stdout(contains("Results").and(contains("12.500")));

    let results = project.latest_results("script");
    assert_eq!(results["success"], json!(true));
    assert_eq!(results["time"], json!(12.5));
    assert_eq!(results["design"], json!("alu"));
    assert_eq!(results["flow"], json!("script"));
    assert_eq!(results["steps"], json!(["synth", "report"]));
    assert!(results["runtime_minutes"].is_number());

    let (fingerprint, flow_dir) = project.fingerprint("script");
    assert_eq!(results["fingerprint"], json!(fingerprint));
    assert!(flow_dir.join("results.json").exists());
    assert!(flow_dir.join("settings.json").exists());
}

#[test]
fn tool_log_holds_exactly_what_the_tool_wrote() {
    let project = Project::new(SCRIPT_PROJECT, &reporting_tool());
    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run", "--quiet"])
        .assert()
        .success();

    let (_, flow_dir) = project.fingerprint("script");
    let log = fs::read_to_string(flow_dir.join("mytool_stdout.log")).unwrap();
    let expected = format!(
        "{}\nreading alu.v\n{}\ndone\n",
        step_line("synth"),
        step_line("report")
    );
    assert_eq!(log, expected);
}

#[test]
fn identical_settings_reuse_the_run_directory() {
    let project = Project::new(SCRIPT_PROJECT, &reporting_tool());
    let before = project.fingerprint("script");

    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .success();
    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .success()
        .stderr(contains("reusing"));

    assert_eq!(project.fingerprint("script"), before);

    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run", "--force"])
        .assert()
        .success()
        .stderr(contains("Using existing run directory"));
}

#[test]
fn changing_a_source_changes_the_fingerprint() {
    let project = Project::new(SCRIPT_PROJECT, &reporting_tool());
    let (before, _) = project.fingerprint("script");
    fs::write(project.path().join("alu.v"), "module alu; endmodule\n").unwrap();
    let (after, _) = project.fingerprint("script");
    assert_ne!(before, after);

    let overridden = project
        .edaflow()
        .args(["fingerprint", "script", "--run-dir", "run", "--set", "script.nthreads=8"])
        .output()
        .unwrap();
    assert!(overridden.status.success());
    assert!(!String::from_utf8_lossy(&overridden.stdout).contains(&after));
}

#[test]
fn non_zero_exit_fails_the_run() {
    let project = Project::new(SCRIPT_PROJECT, "echo 'ERROR: no license'\nexit 2");
    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .failure()
        .stderr(contains("return code 2"));

    let results = project.latest_results("script");
    assert_eq!(results["success"], json!(false));
}

#[test]
fn missing_report_marks_the_flow_failed() {
    let project = Project::new(SCRIPT_PROJECT, "echo 'nothing to report'");
    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .code(1)
        .stderr(contains("does not exist"));

    let results = project.latest_results("script");
    assert_eq!(results["success"], json!(false));
}

#[test]
fn unmatched_report_pattern_is_fatal() {
    let project = Project::new(
        SCRIPT_PROJECT,
        "echo 'slack: 0.3' > \"$EDAFLOW_REPORTS_DIR/timing.rpt\"",
    );
    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .failure()
        .stderr(contains("pattern not matched"));
}

#[test]
fn self_dependency_is_a_cycle() {
    let project = Project::new(SCRIPT_PROJECT, &reporting_tool());
    project
        .edaflow()
        .args([
            "run",
            "script",
            "--run-dir",
            "run",
            "--set",
            r#"script.dependencies=["script"]"#,
        ])
        .assert()
        .failure()
        .stderr(contains("dependency cycle: script -> script"));
}

#[test]
fn several_designs_need_a_selection() {
    let toml = format!("{SCRIPT_PROJECT}\n[[design]]\nname = \"fifo\"\n");
    let project = Project::new(&toml, &reporting_tool());
    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .failure()
        .stderr(contains("--design").and(contains("alu, fifo")));

    project
        .edaflow()
        .args(["run", "script", "--run-dir", "run", "--design", "alu", "--quiet"])
        .assert()
        .success();
}

#[test]
fn missing_tool_is_reported() {
    let project = Project::new(SCRIPT_PROJECT, "true");
    project
        .edaflow()
        .env("EDAFLOW_BIN_MYTOOL", project.path().join("bin").join("gone"))
        .args(["run", "script", "--run-dir", "run"])
        .assert()
        .failure()
        .stderr(contains("cannot execute"));
}
