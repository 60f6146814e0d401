use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use sha2::{Digest, Sha256};

use crate::error::SettingsError;

/// A file referenced from a settings tree, pinned to its resolved path and the
/// SHA-256 of its bytes at the time it was first seen.
///
/// Two resources are equal only when both the content hash and the resolved
/// path agree: identical bytes living in two different files are distinct.
#[derive(Debug, Clone)]
pub struct FileResource {
    file: PathBuf,
    hash: String,
}

impl FileResource {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let file = fs::canonicalize(path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => SettingsError::ResourceNotFound {
                path: path.to_path_buf(),
            },
            _ => SettingsError::ResourceUnreadable {
                path: path.to_path_buf(),
                error,
            },
        })?;
        let bytes = fs::read(&file).map_err(|error| SettingsError::ResourceUnreadable {
            path: file.clone(),
            error,
        })?;
        let hash = format!("{:x}", Sha256::digest(&bytes));
        Ok(Self { file, hash })
    }

    /// Resolves `path` against `base` when it is relative.
    pub fn resolve_in<P: AsRef<Path>>(base: &Path, path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if path.is_absolute() {
            Self::new(path)
        } else {
            Self::new(base.join(path))
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn content_hash(&self) -> &str {
        &self.hash
    }

    /// `{file, hash}`. Paths that are not valid UTF-8 are rendered lossily.
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert("file".to_string(), self.file.display().to_string().into());
        map.insert("hash".to_string(), self.hash.clone().into());
        JsonValue::Object(map)
    }

    /// True when `other` holds the same bytes, regardless of where it lives.
    pub fn same_content(&self, other: &FileResource) -> bool {
        self.hash == other.hash
    }
}

impl PartialEq for FileResource {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.file == other.file
    }
}

impl Eq for FileResource {}

impl Hash for FileResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
        self.file.hash(state);
    }
}

impl Serialize for FileResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for FileResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Vhdl,
    Verilog,
    SystemVerilog,
    Bsv,
    Bs,
    Unknown,
}

impl SourceKind {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "vhdl" => SourceKind::Vhdl,
            "verilog" => SourceKind::Verilog,
            "systemverilog" => SourceKind::SystemVerilog,
            "bsv" => SourceKind::Bsv,
            "bs" => SourceKind::Bs,
            _ => SourceKind::Unknown,
        }
    }

    /// Kind and variant implied by a file extension.
    pub fn from_extension(extension: &str) -> (Self, Option<&'static str>) {
        match extension {
            "vhd" | "vhdl" => (SourceKind::Vhdl, None),
            "v" => (SourceKind::Verilog, None),
            "sv" => (SourceKind::Verilog, Some("systemverilog")),
            "bsv" => (SourceKind::Bsv, None),
            "bs" => (SourceKind::Bs, None),
            _ => (SourceKind::Unknown, None),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Vhdl => "vhdl",
            SourceKind::Verilog => "verilog",
            SourceKind::SystemVerilog => "systemverilog",
            SourceKind::Bsv => "bsv",
            SourceKind::Bs => "bs",
            SourceKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A hardware design source file with its language kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DesignSource {
    resource: FileResource,
    kind: SourceKind,
    variant: Option<String>,
    standard: Option<String>,
}

impl DesignSource {
    /// Infers kind and variant from the file extension. Unrecognized
    /// extensions are accepted with [`SourceKind::Unknown`].
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let resource = FileResource::new(path)?;
        let extension = resource
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let (kind, variant) = SourceKind::from_extension(&extension);
        Ok(Self {
            resource,
            kind,
            variant: variant.map(str::to_string),
            standard: None,
        })
    }

    pub fn with_kind<P: AsRef<Path>>(
        path: P,
        kind: SourceKind,
        variant: Option<String>,
        standard: Option<String>,
    ) -> Result<Self, SettingsError> {
        Ok(Self {
            resource: FileResource::new(path)?,
            kind,
            variant,
            standard,
        })
    }

    /// Builds a source from a settings entry: either a bare path string or a
    /// table `{ file, type?, variant?, standard? }`. Relative paths resolve
    /// against `base`.
    pub fn from_setting(base: &Path, entry: &JsonValue) -> Result<Self, SettingsError> {
        let resolve = |raw: &str| {
            let path = Path::new(raw);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };
        match entry {
            JsonValue::String(raw) => Self::new(resolve(raw)),
            JsonValue::Object(map) => {
                let Some(file) = map.get("file").and_then(|value| value.as_str()) else {
                    return Err(SettingsError::Invalid {
                        errors: vec![format!("design source `{entry}` is missing `file`")],
                    });
                };
                let text = |key: &str| {
                    map.get(key)
                        .and_then(|value| value.as_str())
                        .map(str::to_string)
                };
                match text("type") {
                    Some(kind) => Self::with_kind(
                        resolve(file),
                        SourceKind::parse(&kind),
                        text("variant"),
                        text("standard"),
                    ),
                    None => {
                        let mut source = Self::new(resolve(file))?;
                        if let Some(variant) = text("variant") {
                            source.variant = Some(variant);
                        }
                        source.standard = text("standard");
                        Ok(source)
                    }
                }
            }
            other => Err(SettingsError::Invalid {
                errors: vec![format!(
                    "design source must be a path or a table, got `{other}`"
                )],
            }),
        }
    }

    pub fn resource(&self) -> &FileResource {
        &self.resource
    }

    pub fn path(&self) -> &Path {
        self.resource.path()
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn standard(&self) -> Option<&str> {
        self.standard.as_deref()
    }

    /// The resource's `{file, hash}` plus `type`, `variant` and `standard`.
    pub fn to_json(&self) -> JsonValue {
        let mut json = self.resource.to_json();
        if let JsonValue::Object(map) = &mut json {
            map.insert("type".to_string(), self.kind.to_string().into());
            map.insert(
                "variant".to_string(),
                self.variant.clone().map_or(JsonValue::Null, JsonValue::from),
            );
            map.insert(
                "standard".to_string(),
                self.standard.clone().map_or(JsonValue::Null, JsonValue::from),
            );
        }
        json
    }
}

impl Serialize for DesignSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for DesignSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.resource, f)
    }
}
