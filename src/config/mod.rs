//! # Deployment Context
//!
//! Raw context loading: Context file → `-c key=value` overrides
//!
//! ## Sources
//!
//! 1. **Context file** (`--context-file`, YAML or JSON)
//!    - Either a flat mapping of keys, or a cdk.json-style document with
//!      the keys nested under `context:`
//!
//! 2. **Overrides** (`-c key=value`, repeatable)
//!    - Applied last, so they win over the file
//!
//! The merged [`RawContext`] is handed to [`resolve`] which produces the
//! validated [`DeploymentParameters`].
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let raw = load_raw_context(Some(Path::new("cdk.json")), &["owner=alice".into()])?;
//! let params = resolve(&raw)?;
//! ```

mod environment;
mod parameters;

pub use environment::{EnvironmentContext, DEFAULT_REGION};
pub use parameters::{keys, resolve, DeploymentParameters, NatMode};

use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use crate::error::ConfigError;

/// Raw key/value context as read from the execution environment
///
/// A `None` value means the key was present but explicitly null.
pub type RawContext = BTreeMap<String, Option<String>>;

/// Load the context file (if any) and apply command-line overrides on top.
pub fn load_raw_context(
    context_file: Option<&Path>,
    overrides: &[String],
) -> Result<RawContext, ConfigError> {
    let mut raw = match context_file {
        Some(path) => load_context_file(path)?,
        None => RawContext::new(),
    };

    for entry in overrides {
        let (key, value) = parse_override(entry)?;
        debug!("Context override: {}={}", key, value);
        raw.insert(key, Some(value));
    }

    Ok(raw)
}

/// Read a YAML or JSON context file from disk.
pub fn load_context_file(path: &Path) -> Result<RawContext, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
        message: format!("failed to read {}: {}", path.display(), e),
    })?;

    debug!("Loaded context file: {}", path.display());
    context_from_str(&content)
}

/// Parse context from YAML (JSON is accepted as a YAML subset).
pub fn context_from_str(content: &str) -> Result<RawContext, ConfigError> {
    let document: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;

    let mapping = match document {
        Value::Null => return Ok(RawContext::new()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(ConfigError::ParseError {
                message: "context must be a mapping of key/value pairs".to_string(),
            })
        }
    };

    // cdk.json keeps the context under a dedicated key
    let nested = mapping.get("context").and_then(Value::as_mapping).cloned();
    let mapping = nested.unwrap_or(mapping);

    let mut raw = RawContext::new();
    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s,
            other => {
                return Err(ConfigError::ParseError {
                    message: format!("context keys must be strings, got: {:?}", other),
                })
            }
        };
        let value = scalar_to_string(&key, value)?;
        raw.insert(key, value);
    }

    Ok(raw)
}

fn scalar_to_string(key: &str, value: Value) -> Result<Option<String>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        // The parsed number may not match what was written (1e3, 0x1F)
        Value::Number(n) if keys::ALL.contains(&key) => Err(ConfigError::invalid(
            key,
            n.to_string(),
            "numeric values must be quoted to keep their exact text",
        )),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s)),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => Err(ConfigError::invalid(
            key,
            format!("{:?}", value),
            "expected a scalar value",
        )),
    }
}

/// Parse a `key=value` override as passed with `-c`.
pub fn parse_override(entry: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = entry.split_once('=').ok_or_else(|| ConfigError::ParseError {
        message: format!("context override '{}' must look like key=value", entry),
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::ParseError {
            message: format!("context override '{}' has an empty key", entry),
        });
    }

    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flat_yaml_context() {
        let raw = context_from_str(
            "deployment_id: lab01\nowner: alice\ndb_multi_az: true\nallowed_ingress_cidr: null\n",
        )
        .unwrap();

        assert_eq!(raw.get("deployment_id"), Some(&Some("lab01".to_string())));
        assert_eq!(raw.get("db_multi_az"), Some(&Some("true".to_string())));
        assert_eq!(raw.get("allowed_ingress_cidr"), Some(&None));
    }

    #[test]
    fn test_cdk_json_context() {
        let raw = context_from_str(
            r#"{"app": "python3 app.py", "context": {"deployment_id": "lab02", "owner": "bob"}}"#,
        )
        .unwrap();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get("owner"), Some(&Some("bob".to_string())));
        assert!(!raw.contains_key("app"));
    }

    #[test]
    fn test_unquoted_numbers_rejected_for_known_keys() {
        let err = context_from_str("deployment_id: 1e3\nowner: alice\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "deployment_id")
        );

        let err = context_from_str("deployment_id: lab01\nowner: 0x1F\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "owner"));

        // Quoted values keep their exact text
        let raw = context_from_str("deployment_id: \"1e3\"\nowner: '0x1F'\n").unwrap();
        let params = resolve(&raw).unwrap();
        assert_eq!(params.deployment_id(), "1e3");
        assert_eq!(params.owner(), "0x1F");

        // Unrecognized keys are ignored downstream
        let raw = context_from_str("deployment_id: lab01\nowner: alice\nretries: 3\n").unwrap();
        assert_eq!(raw.get("retries"), Some(&Some("3".to_string())));
    }

    #[test]
    fn test_empty_document() {
        assert!(context_from_str("").unwrap().is_empty());
    }

    #[test]
    fn test_nested_values_rejected() {
        let err = context_from_str("owner:\n  - alice\n  - bob\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "owner"));
    }

    #[test]
    fn test_non_mapping_rejected() {
        assert!(matches!(
            context_from_str("- a\n- b\n"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("owner=alice").unwrap(),
            ("owner".to_string(), "alice".to_string())
        );
        assert_eq!(
            parse_override("allowed_ingress_cidr=10.0.0.0/8").unwrap().1,
            "10.0.0.0/8"
        );
        // Value may contain '='
        assert_eq!(parse_override("k=a=b").unwrap().1, "a=b");

        assert!(parse_override("owner").is_err());
        assert!(parse_override("=alice").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deployment_id: lab01\nowner: alice").unwrap();

        let raw = load_raw_context(Some(file.path()), &["owner=carol".to_string()]).unwrap();

        assert_eq!(raw.get("deployment_id"), Some(&Some("lab01".to_string())));
        assert_eq!(raw.get("owner"), Some(&Some("carol".to_string())));
    }

    #[test]
    fn test_missing_file() {
        let err = load_context_file(Path::new("/nonexistent/cdk.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
