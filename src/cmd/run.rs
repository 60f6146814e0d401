use std::env;

use anyhow::{Context, Result};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, error, info};

use crate::cli::{FingerprintArgs, RunArgs, SelectArgs};
use crate::config;
use crate::context::{ExecOptions, ExecutionContext};
use crate::flow_runner::FlowRunner;
use crate::flows::builtin_registry;
use crate::project::{Project, resolve_run_root};
use crate::results::print_results;

struct Session {
    ctx: ExecutionContext,
    project: Project,
    design: JsonValue,
}

/// Loads config and project, applies `--set` overrides and resolves the run
/// root and design. `log` carries `(verbose, quiet)` when logging should be
/// installed.
fn open_session(
    select: &SelectArgs,
    options: ExecOptions,
    log: Option<(bool, bool)>,
) -> Result<Session> {
    let config = config::load()?;
    let cwd = env::current_dir().context("failed to resolve the current directory")?;
    let mut project = match &select.project {
        Some(path) => Project::load(path)?,
        None => match Project::discover(&cwd)? {
            Some(project) => project,
            None => Project::from_document(cwd.clone(), json!({}))?,
        },
    };
    for assignment in &select.set {
        project.apply_override(assignment)?;
    }

    let run_root = resolve_run_root(
        select.run_dir.as_deref(),
        Some(&project),
        config.defaults.run_dir.as_deref(),
    )?;
    if let Some((verbose, quiet)) = log {
        let log_file = crate::logging::init(&run_root, verbose, quiet)?;
        debug!("logging to {}", log_file.display());
    }

    let design = project.select_design(select.design.as_deref())?;
    let ctx = ExecutionContext::new(run_root, project.root())
        .with_options(options)
        .with_tools(config.tool_paths());
    Ok(Session {
        ctx,
        project,
        design,
    })
}

/// Runs the selected flow. Returns whether it succeeded.
pub fn run(args: RunArgs) -> Result<bool> {
    let options = ExecOptions {
        quiet: args.quiet,
        verbose: args.verbose,
        force: args.force,
        force_run_dir: args.select.force_run_dir.clone(),
    };
    let session = open_session(&args.select, options, Some((args.verbose, args.quiet)))?;
    session
        .ctx
        .cancel
        .install_signal_handlers()
        .context("failed to install signal handlers")?;

    let registry = builtin_registry();
    let mut runner = FlowRunner::new(
        &registry,
        &session.ctx,
        session.design.clone(),
        session.project.flows().clone(),
    );
    let done = runner.launch(&args.select.flow)?;
    if !args.quiet {
        print_results(&done.results);
    }
    if done.succeeded {
        info!("Flow `{}` succeeded", done.name);
    } else {
        error!(
            "Flow `{}` failed; see {}",
            done.name,
            done.flow_run_dir().display()
        );
    }
    Ok(done.succeeded)
}

pub fn fingerprint(args: &FingerprintArgs) -> Result<()> {
    let options = ExecOptions {
        force_run_dir: args.select.force_run_dir.clone(),
        ..ExecOptions::default()
    };
    let session = open_session(&args.select, options, None)?;
    let registry = builtin_registry();
    let runner = FlowRunner::new(
        &registry,
        &session.ctx,
        session.design.clone(),
        session.project.flows().clone(),
    );
    let flow = runner.prepare(&args.select.flow)?;
    let fingerprint = flow.fingerprint().unwrap_or_default();
    let run_dir = flow
        .dirs()
        .map(|dirs| dirs.flow_run_dir().display().to_string())
        .unwrap_or_default();
    if args.json {
        let out = json!({
            "flow": flow.name(),
            "fingerprint": fingerprint,
            "run_dir": run_dir,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("flow:        {}", flow.name());
        println!("fingerprint: {fingerprint}");
        println!("run_dir:     {run_dir}");
    }
    Ok(())
}
