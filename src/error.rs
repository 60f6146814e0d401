use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use flow_settings::SettingsError;

/// Why a running child process was stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Interrupted,
    Timeout(Duration),
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Interrupted => write!(f, "interrupted by operator"),
            CancelReason::Timeout(limit) => write!(f, "timed out after {limit:?}"),
        }
    }
}

#[derive(Debug)]
pub enum FlowError {
    Settings(SettingsError),
    SettingsInvalid {
        flow: String,
        errors: Vec<String>,
    },
    ExecutableNotFound {
        program: String,
    },
    NonZeroExit {
        program: String,
        code: i32,
        log: PathBuf,
    },
    Cancelled {
        program: String,
        reason: CancelReason,
    },
    ReportPatternNotMatched {
        pattern: String,
        report: PathBuf,
    },
    InvalidPattern {
        pattern: String,
        message: String,
    },
    FlowNotFound {
        name: String,
        known: Vec<String>,
    },
    DependencyCycle {
        chain: Vec<String>,
    },
    DependencyFailed {
        flow: String,
        dependency: String,
    },
    InvalidState {
        flow: String,
        expected: &'static str,
        actual: &'static str,
    },
    DesignNotFound {
        name: String,
        available: Vec<String>,
    },
    DesignAmbiguous {
        available: Vec<String>,
    },
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    Json {
        path: PathBuf,
        error: serde_json::Error,
    },
}

impl FlowError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        FlowError::Io {
            path: path.into(),
            error,
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Settings(error) => write!(f, "{error}"),
            FlowError::SettingsInvalid { flow, errors } => {
                write!(f, "{} error(s) in settings for `{flow}`:", errors.len())?;
                for error in errors {
                    write!(f, "\n  - {error}")?;
                }
                Ok(())
            }
            FlowError::ExecutableNotFound { program } => write!(
                f,
                "cannot execute `{program}`; make sure it is installed and on PATH"
            ),
            FlowError::NonZeroExit { program, code, log } => write!(
                f,
                "`{program}` exited with return code {code}; see `{}`",
                log.display()
            ),
            FlowError::Cancelled { program, reason } => write!(f, "`{program}` {reason}"),
            FlowError::ReportPatternNotMatched { pattern, report } => write!(
                f,
                "error parsing report `{}`: pattern not matched: {pattern}",
                report.display()
            ),
            FlowError::InvalidPattern { pattern, message } => {
                write!(f, "invalid report pattern `{pattern}`: {message}")
            }
            FlowError::FlowNotFound { name, known } => write!(
                f,
                "flow `{name}` is not registered (known flows: {})",
                known.join(", ")
            ),
            FlowError::DependencyCycle { chain } => {
                write!(f, "flow dependency cycle: {}", chain.join(" -> "))
            }
            FlowError::DependencyFailed { flow, dependency } => {
                write!(f, "`{flow}` cannot run because dependency `{dependency}` failed")
            }
            FlowError::InvalidState {
                flow,
                expected,
                actual,
            } => write!(f, "flow `{flow}` must be {expected} but is {actual}"),
            FlowError::DesignNotFound { name, available } => write!(
                f,
                "design `{name}` not found in the project (available: {})",
                available.join(", ")
            ),
            FlowError::DesignAmbiguous { available } => write!(
                f,
                "specify the target design with --design; available designs: {}",
                available.join(", ")
            ),
            FlowError::Io { path, error } => write!(f, "{}: {error}", path.display()),
            FlowError::Json { path, error } => {
                write!(f, "failed to handle JSON `{}`: {error}", path.display())
            }
        }
    }
}

impl Error for FlowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FlowError::Settings(error) => Some(error),
            FlowError::Io { error, .. } => Some(error),
            FlowError::Json { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<SettingsError> for FlowError {
    fn from(value: SettingsError) -> Self {
        FlowError::Settings(value)
    }
}
