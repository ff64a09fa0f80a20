//! Workflow nodes and their dynamically typed parameters.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single step within a workflow's execution graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier, unique within the workflow.
    #[serde(default)]
    pub id: String,
    /// Display name; connection graphs refer to nodes by this name.
    #[serde(default)]
    pub name: String,
    /// Dotted type identifier, for example `n8n-nodes-base.httpRequest`.
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// Version of the node type. May be fractional (`4.2`).
    #[serde(default = "default_type_version")]
    pub type_version: f64,
    /// Canvas position as `[x, y]`.
    #[serde(default)]
    pub position: [i64; 2],
    /// Free-form parameters; shape depends on the node type.
    #[serde(default)]
    pub parameters: NodeParameters,
    /// Fields not modelled above (`credentials`, `webhookId`, `disabled`,
    /// `notes`, ...), carried through unchanged so a full replacement keeps
    /// them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_type_version() -> f64 {
    1.0
}

impl Node {
    /// Creates a node with no parameters.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        type_version: f64,
        position: [i64; 2],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            type_version,
            position,
            parameters: NodeParameters::default(),
            extra: Map::new(),
        }
    }

    /// Adds or replaces a parameter. A malformed parameter set is replaced by
    /// a fresh map holding only this entry.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        match &mut self.parameters {
            NodeParameters::Map(map) => {
                map.insert(key.into(), value.into());
            }
            NodeParameters::Malformed(_) => {
                self.parameters = NodeParameters::Map(IndexMap::from([(key.into(), value.into())]));
            }
        }
        self
    }
}

/// A parameter value classified by its runtime JSON type.
///
/// Classification happens once, when the payload is decoded: numbers that fit
/// an `i64` become [`ParameterValue::Integer`], every other number becomes
/// [`ParameterValue::Float`], and nulls, arrays and objects are kept as
/// [`ParameterValue::Opaque`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Opaque(Value),
}

impl From<Value> for ParameterValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::String(text),
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Self::Integer(integer)
                } else if let Some(float) = number.as_f64() {
                    Self::Float(float)
                } else {
                    Self::Opaque(Value::Number(number))
                }
            }
            other => Self::Opaque(other),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(text) => serializer.serialize_str(text),
            Self::Integer(integer) => serializer.serialize_i64(*integer),
            Self::Float(float) => serializer.serialize_f64(*float),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Opaque(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParameterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// The parameter set of a node.
///
/// An object decodes into an ordered map (document order is kept). Anything
/// other than an object or `null` is kept verbatim as
/// [`NodeParameters::Malformed`] so a single odd node does not fail the
/// decoding of the whole workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeParameters {
    Map(IndexMap<String, ParameterValue>),
    Malformed(Value),
}

impl NodeParameters {
    /// Returns the parameter map unless the payload was malformed.
    pub fn as_map(&self) -> Option<&IndexMap<String, ParameterValue>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Looks up a parameter by key.
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl Default for NodeParameters {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

impl From<IndexMap<String, ParameterValue>> for NodeParameters {
    fn from(map: IndexMap<String, ParameterValue>) -> Self {
        Self::Map(map)
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for NodeParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for NodeParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Map(map) => map.serialize(serializer),
            Self::Malformed(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for NodeParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeParametersVisitor)
    }
}

struct NodeParametersVisitor;

impl<'de> Visitor<'de> for NodeParametersVisitor {
    type Value = NodeParameters;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON value holding node parameters")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, ParameterValue>()? {
            map.insert(key, value);
        }
        Ok(NodeParameters::Map(map))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NodeParameters::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(NodeParameters::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = access.next_element::<Value>()? {
            items.push(item);
        }
        Ok(NodeParameters::Malformed(Value::Array(items)))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(NodeParameters::Malformed(Value::Bool(value)))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(NodeParameters::Malformed(Value::from(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(NodeParameters::Malformed(Value::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(NodeParameters::Malformed(Value::from(value)))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(NodeParameters::Malformed(Value::String(value.to_string())))
    }
}
