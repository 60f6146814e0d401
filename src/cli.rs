use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "edaflow")]
#[command(version)]
#[command(about = "Run EDA tool flows with content-addressed run directories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a flow (and its prerequisites) against a design
    Run(RunArgs),
    /// List registered flows and what they require
    List(ListArgs),
    /// Prepare a flow without running it and print its fingerprint
    Fingerprint(FingerprintArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SelectArgs {
    /// Flow name, e.g. `script` or `acme.place_route`
    #[arg(value_name = "FLOW")]
    pub flow: String,
    /// Project file (defaults to edaflow.{toml,json,yaml,yml} in the current directory)
    #[arg(long = "project", value_name = "FILE")]
    pub project: Option<PathBuf>,
    /// Design to use when the project defines several
    #[arg(long = "design", value_name = "NAME")]
    pub design: Option<String>,
    /// Root for run directories, results and logs
    #[arg(long = "run-dir", value_name = "DIR")]
    pub run_dir: Option<PathBuf>,
    /// Use DIR instead of the fingerprinted run directory
    #[arg(long = "force-run-dir", value_name = "DIR")]
    pub force_run_dir: Option<PathBuf>,
    /// Override a flow setting: flow.key=value (value parsed as JSON when possible)
    #[arg(long = "set", value_name = "FLOW.KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Re-run even when results for identical settings exist
    #[arg(long = "force")]
    pub force: bool,
    /// Suppress tool output and the progress spinner
    #[arg(long = "quiet", short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
    /// Echo every tool output line and log at debug level
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit JSON instead of a table
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    #[command(flatten)]
    pub select: SelectArgs,
    /// Emit JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_collects_overrides() {
        let cli = Cli::parse_from([
            "edaflow",
            "run",
            "script",
            "--set",
            "script.nthreads=4",
            "--set",
            "script.check=false",
            "--force",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.select.flow, "script");
        assert_eq!(args.select.set.len(), 2);
        assert!(args.force);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["edaflow", "run", "script", "-q", "-v"]).is_err());
    }
}
