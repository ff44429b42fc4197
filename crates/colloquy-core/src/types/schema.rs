//! Declared tool input schemas and argument validation
//!
//! Tool arguments arrive from the model as loosely-typed JSON. Every payload
//! is checked against the tool's declared schema before a handler sees it, so
//! handlers can rely on required fields being present with the right types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Declared type of a single schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// JSON-Schema type keyword for this field type
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

/// One declared field: name, type and whether it must be present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
}

/// How argument payloads are treated when they carry undeclared fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Reject payloads containing fields the schema does not declare
    Strict,
    /// Ignore undeclared fields and validate the rest
    AllowUnknown,
}

impl Default for ValidationMode {
    fn default() -> Self {
        ValidationMode::Strict
    }
}

/// A schema check that failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("missing required field `{name}`")]
    MissingField { name: String },
    #[error("field `{name}` expected {expected}, got {got}")]
    WrongType {
        name: String,
        expected: &'static str,
        got: &'static str,
    },
    #[error("unexpected field `{name}`")]
    UnexpectedField { name: String },
}

/// Declared input schema for one tool: field name, type and required flag
///
/// Fields keep declaration order, which is also the order they appear in the
/// JSON-Schema payload sent to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    /// Create an empty schema (a tool that takes no arguments)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field
    pub fn required(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            field_type,
            required: true,
        });
        self
    }

    /// Add an optional field
    pub fn optional(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            field_type,
            required: false,
        });
        self
    }

    /// Look up a declared field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check an arguments payload against this schema
    pub fn validate(&self, arguments: &Value, mode: ValidationMode) -> Result<(), SchemaViolation> {
        let map = arguments.as_object().ok_or(SchemaViolation::NotAnObject)?;

        for spec in &self.fields {
            match map.get(&spec.name) {
                Some(value) => {
                    if !spec.field_type.matches(value) {
                        return Err(SchemaViolation::WrongType {
                            name: spec.name.clone(),
                            expected: spec.field_type.keyword(),
                            got: json_type_name(value),
                        });
                    }
                }
                None if spec.required => {
                    return Err(SchemaViolation::MissingField {
                        name: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        if mode == ValidationMode::Strict {
            if let Some(name) = map.keys().find(|k| self.field(k).is_none()) {
                return Err(SchemaViolation::UnexpectedField { name: name.clone() });
            }
        }

        Ok(())
    }

    /// Render this schema as the JSON-Schema object the provider wire expects
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for spec in &self.fields {
            properties.insert(
                spec.name.clone(),
                serde_json::json!({ "type": spec.field_type.keyword() }),
            );
            if spec.required {
                required.push(Value::String(spec.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
