use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOGS_SUBDIR: &str = "Logs";

/// `<run_root>/Logs/edaflow_<timestamp>.log`
pub fn log_file_path(run_root: &Path, at: OffsetDateTime) -> PathBuf {
    let stamp = at
        .format(format_description!(
            "[year]-[month]-[day]-[hour][minute][second]"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    run_root
        .join(LOGS_SUBDIR)
        .join(format!("edaflow_{stamp}.log"))
}

/// Installs the console layer (RUST_LOG, else info; debug with `verbose`,
/// warn with `quiet`) and a debug-level file layer under the run root.
/// Returns the log file path.
pub fn init(run_root: &Path, verbose: bool, quiet: bool) -> Result<PathBuf> {
    let path = log_file_path(run_root, OffsetDateTime::now_utc());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;

    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG),
        )
        .try_init()
        .context("failed to install the log subscriber")?;
    Ok(path)
}
