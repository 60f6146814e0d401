use serde_json::Value as JsonValue;

use crate::error::SettingsError;

/// Validates `instance` against a JSON schema, reporting every violation.
pub fn validate_against_schema(instance: &JsonValue, schema_json: &str) -> Result<(), SettingsError> {
    let schema: JsonValue =
        serde_json::from_str(schema_json).map_err(|error| SettingsError::SchemaCompile {
            message: format!("invalid schema JSON: {error}"),
        })?;
    let validator =
        jsonschema::validator_for(&schema).map_err(|error| SettingsError::SchemaCompile {
            message: error.to_string(),
        })?;

    let errors = validator
        .iter_errors(instance)
        .map(|error| error.to_string())
        .collect::<Vec<_>>();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SettingsError::Invalid { errors })
    }
}

/// Checks required keys and an optional schema together so callers see the
/// full list of problems at once.
pub fn check_settings(
    instance: &JsonValue,
    required: &[&str],
    schema_json: Option<&str>,
) -> Result<(), SettingsError> {
    let mut errors = Vec::new();
    for key in required {
        let present = instance
            .get(*key)
            .map(|value| !value.is_null())
            .unwrap_or(false);
        if !present {
            errors.push(format!("`{key}` is required"));
        }
    }

    if let Some(schema) = schema_json {
        match validate_against_schema(instance, schema) {
            Ok(()) => {}
            Err(SettingsError::Invalid { errors: found }) => errors.extend(found),
            Err(other) => return Err(other),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SettingsError::Invalid { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "clock_period": { "type": "number" },
            "nthreads": { "type": "integer", "minimum": 1 }
        }
    }"#;

    #[test]
    fn accepts_valid_settings() {
        let settings = json!({"clock_period": 5.0, "nthreads": 2});
        check_settings(&settings, &["clock_period"], Some(SCHEMA)).unwrap();
    }

    #[test]
    fn collects_every_violation() {
        let settings = json!({"nthreads": 0});
        let err = check_settings(&settings, &["clock_period", "top"], Some(SCHEMA)).unwrap_err();
        let SettingsError::Invalid { errors } = err else {
            panic!("expected Invalid, got {err:?}");
        };
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("clock_period")));
        assert!(errors.iter().any(|e| e.contains("top")));
    }

    #[test]
    fn rejects_broken_schema() {
        let err = validate_against_schema(&json!({}), "{not json").unwrap_err();
        assert!(matches!(err, SettingsError::SchemaCompile { .. }));
    }
}
