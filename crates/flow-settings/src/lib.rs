pub mod error;
pub mod fingerprint;
pub mod merge;
pub mod resource;
pub mod schema;
pub mod value;

pub use error::SettingsError;
pub use fingerprint::{FINGERPRINT_LEN, fingerprint, fingerprint_json};
pub use merge::merge_with_defaults;
pub use resource::{DesignSource, FileResource, SourceKind};
pub use schema::{check_settings, validate_against_schema};
pub use value::Value;
