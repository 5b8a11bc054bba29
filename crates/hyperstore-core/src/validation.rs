//! JSON Schema validation of payloads

use crate::error::{Error, Result};
use crate::types::SchemaDocument;
use serde_json::Value;

/// Key injected into payloads while they are validated, so schemas can
/// discriminate on the schema they are checked against
pub const SCHEMA_MARKER: &str = "_schema";

/// A compiled JSON Schema
pub struct PayloadValidator {
    schema_id: String,
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for PayloadValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadValidator")
            .field("schema_id", &self.schema_id)
            .finish()
    }
}

impl PayloadValidator {
    pub fn compile(document: &SchemaDocument) -> Result<Self> {
        Self::from_value(&document.schema_id, &document.body)
    }

    pub fn from_value(schema_id: &str, body: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(body).map_err(|e| Error::InvalidSchema {
            schema_id: schema_id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            schema_id: schema_id.to_string(),
            validator,
        })
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Every violation of `instance`, empty when valid
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        self.validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect()
    }

    /// Validate a document as is
    pub fn validate(&self, instance: &Value, context: &str) -> Result<()> {
        let errors = self.violations(instance);
        if errors.is_empty() {
            return Ok(());
        }
        for (i, error) in errors.iter().enumerate() {
            tracing::error!("ERROR {} in {}: {}", i, context, error);
        }
        Err(Error::SchemaViolation {
            context: context.to_string(),
            errors,
        })
    }

    /// Validate a record payload with the schema marker temporarily set.
    /// The marker is removed again whatever the outcome.
    pub fn validate_marked(&self, payload: &mut Value, context: &str) -> Result<()> {
        let Some(object) = payload.as_object_mut() else {
            return self.validate(payload, context);
        };
        object.insert(
            SCHEMA_MARKER.to_string(),
            Value::String(self.schema_id.clone()),
        );
        let outcome = self.validate(payload, context);
        if let Some(object) = payload.as_object_mut() {
            object.remove(SCHEMA_MARKER);
        }
        if outcome.is_err() {
            tracing::error!("ERROR while validating {}", payload);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gene_validator() -> PayloadValidator {
        let doc = SchemaDocument::from_value(
            json!({
                "$id": "urn:gene",
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "properties": {
                    "_id": {"type": "string"},
                    "_schema": {"const": "urn:gene"},
                    "name": {"type": "string"},
                    "score": {"type": "number"}
                },
                "required": ["_id", "_schema", "name"]
            }),
            "gene.json",
        )
        .unwrap();
        PayloadValidator::compile(&doc).unwrap()
    }

    #[test]
    fn test_marker_is_injected_then_removed() {
        let v = gene_validator();
        let mut payload = json!({"_id": "BRCA1", "name": "BRCA1"});
        v.validate_marked(&mut payload, "Node data").unwrap();
        assert!(payload.get(SCHEMA_MARKER).is_none());
    }

    #[test]
    fn test_all_violations_reported() {
        let v = gene_validator();
        let mut payload = json!({"_id": 7, "score": "high"});
        let err = v.validate_marked(&mut payload, "Node data").unwrap_err();
        match err {
            Error::SchemaViolation { errors, .. } => assert!(errors.len() >= 3),
            other => panic!("unexpected error: {other}"),
        }
        assert!(payload.get(SCHEMA_MARKER).is_none());
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let err = PayloadValidator::from_value("urn:bad", &json!({"type": 12})).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }
}
