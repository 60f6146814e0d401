use std::process;

use anyhow::Result;
use clap::Parser;
use edaflow::cli::{Cli, Command};
use edaflow::cmd;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            if !cmd::run::run(args)? {
                process::exit(1);
            }
            Ok(())
        }
        Command::List(args) => cmd::list::run(&args),
        Command::Fingerprint(args) => cmd::run::fingerprint(&args),
    }
}
