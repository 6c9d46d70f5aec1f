//! Argument validation against a tool's parameter schema.

use jsonschema::Validator;
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

/// First schema violation found in a set of arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentViolation {
    /// JSON pointer of the offending field. For a missing required field this
    /// points at the field itself, not at its parent object.
    pub path: String,
    pub message: String,
}

/// Compiled parameter schema of one tool.
pub struct ArgumentValidator {
    validator: Validator,
}

impl ArgumentValidator {
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let validator = jsonschema::validator_for(schema).map_err(|err| err.to_string())?;
        Ok(Self { validator })
    }

    pub fn check(&self, args: &Value) -> Result<(), ArgumentViolation> {
        let Some(error) = self.validator.iter_errors(args).next() else {
            return Ok(());
        };

        let parent = error.instance_path.to_string();
        let path = match &error.kind {
            ValidationErrorKind::Required { property } => {
                let field = property
                    .as_str()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| property.to_string());
                format!("{parent}/{field}")
            }
            _ if parent.is_empty() => "/".to_string(),
            _ => parent,
        };

        Err(ArgumentViolation {
            path,
            message: error.to_string(),
        })
    }
}
