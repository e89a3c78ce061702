//! JSON Schema validation for rule configurations.
//!
//! The schema is embedded at compile time from `schema/rules.schema.json`
//! and compiled once on first use.

use std::sync::OnceLock;

use thiserror::Error;

const RULES_SCHEMA_JSON: &str = include_str!("../../schema/rules.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(RULES_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a configuration value against the rules schema.
///
/// Returns every violation, each suffixed with its instance path.
pub fn validate_config_schema(config: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(config)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether a configuration value satisfies the schema.
pub fn is_valid_config(config: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(config))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_passes() {
        let value = serde_json::json!({ "document_to_check": "doc.json" });
        assert!(validate_config_schema(&value).is_ok());
        assert!(is_valid_config(&value));
    }

    #[test]
    fn test_wrong_types_report_paths() {
        let value = serde_json::json!({
            "document_to_check": "doc.json",
            "table_rules": [{ "heading_text": "适用产品", "table_index": -1 }],
            "content_rules": "not a list"
        });
        let errors = validate_config_schema(&value).unwrap_err();
        assert!(errors.len() >= 2);
        assert!(errors.iter().any(|e| e.contains("/table_rules/0/table_index")));
        assert!(errors.iter().any(|e| e.contains("/content_rules")));
    }

    #[test]
    fn test_font_size_accepts_number_or_name() {
        let value = serde_json::json!({
            "document_to_check": "doc.json",
            "font_rules": {
                "heading_font_rules": {
                    "Heading 1": { "font_size": "小四" },
                    "Heading 2": { "font_size": 14 }
                },
                "content_font_rules": { "font_size": true }
            }
        });
        let errors = validate_config_schema(&value).unwrap_err();
        assert!(errors.iter().all(|e| e.contains("content_font_rules/font_size")));
    }

    #[test]
    fn test_column_value_check_requires_allowed_values() {
        let value = serde_json::json!({
            "document_to_check": "doc.json",
            "table_rules": [{
                "heading_text": "适用产品",
                "table_index": 0,
                "column_value_check": { "column_header": "状态" }
            }]
        });
        assert!(!is_valid_config(&value));
    }
}
