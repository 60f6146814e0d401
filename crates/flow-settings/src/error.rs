use std::error::Error;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SettingsError {
    ResourceNotFound {
        path: PathBuf,
    },
    ResourceUnreadable {
        path: PathBuf,
        error: std::io::Error,
    },
    /// A referenced file vanished between construction and fingerprinting.
    ResourceMissing {
        path: PathBuf,
    },
    SchemaCompile {
        message: String,
    },
    Invalid {
        errors: Vec<String>,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::ResourceNotFound { path } => {
                write!(f, "file `{}` does not exist", path.display())
            }
            SettingsError::ResourceUnreadable { path, error } => {
                write!(f, "failed to read `{}`: {error}", path.display())
            }
            SettingsError::ResourceMissing { path } => {
                write!(
                    f,
                    "file `{}` disappeared before it could be fingerprinted",
                    path.display()
                )
            }
            SettingsError::SchemaCompile { message } => {
                write!(f, "failed to compile settings schema: {message}")
            }
            SettingsError::Invalid { errors } => {
                write!(f, "{} settings error(s):", errors.len())?;
                for error in errors {
                    write!(f, "\n  - {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SettingsError::ResourceUnreadable { error, .. } => Some(error),
            _ => None,
        }
    }
}
