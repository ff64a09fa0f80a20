//! # Dynamic value translation
//!
//! Node parameters arrive as loosely typed JSON maps. The functions here turn
//! them into `(key, kind, value)` triples whose value is always a string, and
//! turn connection graphs into compact JSON text, so that a schema-driven
//! consumer can store them in fixed-type attributes.
//!
//! Formatting rules:
//!
//! | Kind      | Text                                   |
//! |-----------|----------------------------------------|
//! | `string`  | the string itself                      |
//! | `int`     | decimal integer                        |
//! | `float`   | fixed, six decimal places (`9.990000`) |
//! | `bool`    | `true` / `false`                       |
//! | `unknown` | compact JSON of the value (lossy)      |

use std::fmt;

use indexmap::IndexMap;
use n8n_api::{Error, Result};
use n8n_types::{Connections, NodeParameters, ParameterValue};
use serde::Serialize;

/// Runtime type tag of a translated parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Int,
    Float,
    Bool,
    Unknown,
}

impl ParameterKind {
    /// The tag stored alongside the value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter flattened to string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedParameter {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub value: String,
}

impl TypedParameter {
    fn new(key: &str, value: &ParameterValue) -> Self {
        let (kind, value) = classify(value);
        Self {
            key: key.to_string(),
            kind,
            value,
        }
    }
}

fn classify(value: &ParameterValue) -> (ParameterKind, String) {
    match value {
        ParameterValue::String(text) => (ParameterKind::String, text.clone()),
        ParameterValue::Integer(integer) => (ParameterKind::Int, integer.to_string()),
        ParameterValue::Float(float) => (ParameterKind::Float, format!("{float:.6}")),
        ParameterValue::Bool(flag) => (ParameterKind::Bool, flag.to_string()),
        // Display for Value is compact JSON and never empty.
        ParameterValue::Opaque(other) => (ParameterKind::Unknown, other.to_string()),
    }
}

/// Flattens a parameter map into typed triples.
///
/// Never fails. The output follows the map's iteration order; callers that
/// need a stable order across payloads should sort by key.
pub fn translate_parameters(parameters: &IndexMap<String, ParameterValue>) -> Vec<TypedParameter> {
    parameters
        .iter()
        .map(|(key, value)| TypedParameter::new(key, value))
        .collect()
}

/// Flattens a node's parameter set.
///
/// # Errors
///
/// Returns [`Error::Translation`] when the node carried something other than
/// a JSON object as its parameters.
pub fn translate_node_parameters(parameters: &NodeParameters) -> Result<Vec<TypedParameter>> {
    match parameters {
        NodeParameters::Map(map) => Ok(translate_parameters(map)),
        NodeParameters::Malformed(value) => Err(Error::translation(format!(
            "node parameters must be an object, got {}",
            json_type_name(value)
        ))),
    }
}

/// Renders a connection graph as compact JSON text.
///
/// # Errors
///
/// Returns [`Error::Translation`] if the payload cannot be re-serialized.
pub fn canonicalize_connections(connections: &Connections) -> Result<String> {
    let value = connections
        .to_value()
        .map_err(|e| Error::translation(format!("failed to read connections: {e}")))?;
    to_canonical_json(&value)
}

/// Serializes any value as compact JSON.
///
/// # Errors
///
/// Returns [`Error::Translation`] when the value has no JSON form, for example
/// a map keyed by tuples.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).map_err(|e| Error::translation(format!("failed to encode value: {e}")))?;
    serde_json::to_string(&value).map_err(|e| Error::translation(format!("failed to encode value: {e}")))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
