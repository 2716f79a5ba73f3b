//! JSON Schema validation for analysis requests.
//!
//! Request bodies are checked against `schema/analysis_request.schema.json`
//! before they are deserialized, so callers get every violation at once.

use std::sync::OnceLock;
use thiserror::Error;

use crate::types::AnalysisRequest;

/// Embedded request schema (loaded at compile time).
const REQUEST_SCHEMA_JSON: &str = include_str!("../schema/analysis_request.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from request parsing.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Failed to load schema: {0}")]
    SchemaLoad(String),

    #[error("Request failed schema validation: {}", .0.join("; "))]
    SchemaViolations(Vec<String>),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn get_validator() -> Result<&'static jsonschema::Validator, RequestError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(REQUEST_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(RequestError::SchemaLoad(e.clone())),
    }
}

/// Validate a request JSON value against the schema.
pub fn validate_request_schema(request_json: &serde_json::Value) -> Result<(), RequestError> {
    let validator = get_validator()?;

    let errors: Vec<String> = validator
        .iter_errors(request_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RequestError::SchemaViolations(errors))
    }
}

impl AnalysisRequest {
    /// Parse and validate a request from JSON text.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validate a JSON value, then deserialize it.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RequestError> {
        validate_request_schema(&value)?;
        Ok(serde_json::from_value(value)?)
    }
}
