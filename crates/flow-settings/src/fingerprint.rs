//! Order-independent content hashing of settings trees.
//!
//! The tree is first normalized: map keys sorted, sequences kept in order,
//! file leaves expanded into their attributes, every scalar rendered as a
//! string. The normalized tree is serialized to compact JSON and hashed with
//! SHA-256.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::error::SettingsError;
use crate::resource::FileResource;
use crate::value::Value;

/// Hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 32;

#[derive(Serialize)]
#[serde(untagged)]
enum Normalized {
    Text(String),
    Sequence(Vec<Normalized>),
    Map(BTreeMap<String, Normalized>),
}

pub fn fingerprint(value: &Value) -> Result<String, SettingsError> {
    let normalized = normalize(value)?;
    let canonical = serde_json::to_string(&normalized).map_err(|error| SettingsError::Invalid {
        errors: vec![format!("failed to serialize settings for hashing: {error}")],
    })?;
    let digest = format!("{:x}", Sha256::digest(canonical.as_bytes()));
    Ok(digest[..FINGERPRINT_LEN].to_string())
}

pub fn fingerprint_json(value: &JsonValue) -> Result<String, SettingsError> {
    fingerprint(&Value::from(value.clone()))
}

fn normalize(value: &Value) -> Result<Normalized, SettingsError> {
    Ok(match value {
        Value::Null => Normalized::Text("null".to_string()),
        Value::Bool(b) => Normalized::Text(b.to_string()),
        Value::Number(n) => Normalized::Text(n.to_string()),
        Value::String(s) => Normalized::Text(s.clone()),
        Value::Sequence(items) => {
            Normalized::Sequence(items.iter().map(normalize).collect::<Result<_, _>>()?)
        }
        Value::Map(map) => Normalized::Map(
            map.iter()
                .map(|(key, value)| Ok((key.clone(), normalize(value)?)))
                .collect::<Result<_, SettingsError>>()?,
        ),
        Value::File(resource) => Normalized::Map(file_attributes(resource)?),
        Value::Source(source) => {
            let mut attributes = file_attributes(source.resource())?;
            attributes.insert(
                "type".to_string(),
                Normalized::Text(source.kind().to_string()),
            );
            attributes.insert("variant".to_string(), optional(source.variant()));
            attributes.insert("standard".to_string(), optional(source.standard()));
            Normalized::Map(attributes)
        }
    })
}

fn file_attributes(
    resource: &FileResource,
) -> Result<BTreeMap<String, Normalized>, SettingsError> {
    if !resource.path().exists() {
        return Err(SettingsError::ResourceMissing {
            path: resource.path().to_path_buf(),
        });
    }
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "file".to_string(),
        Normalized::Text(resource.path().display().to_string()),
    );
    attributes.insert(
        "hash".to_string(),
        Normalized::Text(resource.content_hash().to_string()),
    );
    Ok(attributes)
}

fn optional(value: Option<&str>) -> Normalized {
    Normalized::Text(value.unwrap_or("null").to_string())
}
