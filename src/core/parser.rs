//! Stack file parsing and validation.
//!
//! Parses stack.yaml and validates structural constraints:
//! - Version must be "1.0"
//! - Provider must be known, name and region non-empty
//! - Every descriptor has a known kind, a name and a well-formed unique key
//! - Required fields per resource kind
//! - References are well-formed and point at earlier descriptors

use super::error::Result;
use super::resolver;
use super::types::*;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

const CONTEXT_KEY_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_-]*$";
const REF_PATH_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)*$";

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Parse a stack file from disk.
pub fn parse_config_file(path: &Path) -> Result<StackConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse a stack file from a string.
pub fn parse_config(yaml: &str) -> Result<StackConfig> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &StackConfig) -> Vec<ValidationError> {
    validate_config_with(config, config.policy.references)
}

/// Validate under an explicit reference policy. Reference ordering is only
/// enforced under [`RefPolicy::Strict`].
pub fn validate_config_with(config: &StackConfig, references: RefPolicy) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", config.version),
        });
    }

    if config.name.trim().is_empty() {
        errors.push(ValidationError {
            message: "name must not be empty".to_string(),
        });
    }

    if let Err(e) = config.cloud_provider() {
        errors.push(ValidationError {
            message: e.to_string(),
        });
    }

    if config.region.trim().is_empty() {
        errors.push(ValidationError {
            message: "region must not be empty".to_string(),
        });
    }

    if config.budget_limit < 0.0 {
        errors.push(ValidationError {
            message: format!("budget_limit must not be negative, got {}", config.budget_limit),
        });
    }

    errors.extend(validate_descriptors(&config.resources));
    if references == RefPolicy::Strict {
        errors.extend(
            resolver::check_reference_order(&config.resources)
                .into_iter()
                .map(ValidationError::from),
        );
    }
    errors
}

/// Validate each descriptor on its own (kind, name, key, fields, ref syntax).
pub fn validate_descriptors(descriptors: &[ResourceDescriptor]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    // Both patterns are literals
    let (key_re, path_re) = match (Regex::new(CONTEXT_KEY_PATTERN), Regex::new(REF_PATH_PATTERN)) {
        (Ok(k), Ok(p)) => (k, p),
        (Err(e), _) | (_, Err(e)) => {
            errors.push(ValidationError {
                message: format!("internal pattern error: {}", e),
            });
            return errors;
        }
    };
    let mut seen_keys: HashSet<&str> = HashSet::new();

    for (index, d) in descriptors.iter().enumerate() {
        let key = d.context_key();
        let label = if key.is_empty() {
            format!("#{}", index)
        } else {
            key.to_string()
        };

        if d.name.trim().is_empty() {
            errors.push(format!("resource {} has no name", label).into());
        }

        if !key_re.is_match(key) {
            errors.push(
                format!(
                    "resource {} has an invalid key '{}' (letters, digits, '-' and '_', starting with a letter)",
                    label, key
                )
                .into(),
            );
        }

        if !seen_keys.insert(key) {
            errors.push(format!("duplicate resource key '{}'", key).into());
        }

        match d.resource_kind() {
            Ok(kind) => {
                for field in kind.required_fields() {
                    if !d.fields.contains_key(*field) {
                        errors.push(
                            format!("resource '{}' ({}) has no {}", label, kind, field).into(),
                        );
                    }
                }
            }
            Err(e) => errors.push(format!("resource '{}': {}", label, e).into()),
        }

        for path in resolver::ref_paths(&Value::Object(d.fields.clone())) {
            if !path_re.is_match(&path) {
                errors.push(
                    format!("resource '{}' has a malformed reference '{}'", label, path).into(),
                );
            }
        }
    }
    errors
}
