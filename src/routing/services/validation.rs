//! JSON-schema validation of submitted responses.

use crate::routing::error::EngineError;
use jsonschema::JSONSchema;
use serde_json::{Map, Value};

/// Validates a response map against a stage schema.
///
/// Only the first violation is reported; its instance path becomes the
/// `pass` pointer of the resulting envelope so the submitter can be
/// pointed at the offending field.
///
/// # Errors
///
/// Returns [`EngineError::ValidationFailure`] when the schema does not
/// compile or the responses violate it.
pub fn validate_responses(
    schema: &Value,
    responses: &Map<String, Value>,
) -> Result<(), EngineError> {
    let compiled = JSONSchema::compile(schema).map_err(|err| EngineError::ValidationFailure {
        message: format!("stage schema does not compile: {err}"),
        pass: None,
    })?;
    let instance = Value::Object(responses.clone());
    let first = compiled.validate(&instance).err().and_then(|mut errors| {
        errors
            .next()
            .map(|violation| (violation.to_string(), violation.instance_path.to_string()))
    });
    match first {
        Some((message, pointer)) => Err(EngineError::ValidationFailure {
            message,
            pass: (!pointer.is_empty()).then_some(pointer),
        }),
        None => Ok(()),
    }
}
