//! Advisory schema validation for justification records.
//!
//! Validation never blocks persistence.  When no schema is configured, or the
//! configured one cannot be loaded, the agent runs with [`NoopValidator`].

use std::path::Path;

use jsonschema::Draft;
use serde_json::Value;
use tracing::warn;

/// Result of checking one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// No schema is active.
    Skipped,
    Invalid(Vec<String>),
}

/// Validate-or-report contract shared by the real and no-op validators.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, record: &Value) -> Validation;
}

/// Accepts everything without looking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidator;

impl SchemaValidator for NoopValidator {
    fn validate(&self, _record: &Value) -> Validation {
        Validation::Skipped
    }
}

/// JSON Schema (draft 2020-12) validator.
pub struct JsonSchemaValidator {
    validator: jsonschema::Validator,
}

impl JsonSchemaValidator {
    pub fn from_value(schema: &Value) -> Result<Self, String> {
        jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map(|validator| Self { validator })
            .map_err(|e| format!("invalid schema: {e}"))
    }

    pub fn from_path(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
        let schema: Value =
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?;
        Self::from_value(&schema)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, record: &Value) -> Validation {
        let messages: Vec<String> = self.validator.iter_errors(record).map(|e| e.to_string()).collect();
        if messages.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(messages)
        }
    }
}

/// Load the schema at `path`, falling back to [`NoopValidator`] with a warning.
pub fn load_validator(path: &Path) -> Box<dyn SchemaValidator> {
    match JsonSchemaValidator::from_path(path) {
        Ok(v) => Box::new(v),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "justification schema unavailable; skipping validation");
            Box::new(NoopValidator)
        }
    }
}
