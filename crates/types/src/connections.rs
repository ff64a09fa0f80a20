//! Opaque connection graphs.
//!
//! The service describes edges between nodes as
//! `{ "<source node>": { "<channel>": [[{ "node", "type", "index" }]] } }`.
//! The nesting varies with the topology of the workflow, so the payload is
//! carried as raw JSON text and only parsed on demand.

use indexmap::IndexMap;
use serde::de::{Error as _, IgnoredAny};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use serde_json::value::RawValue;

/// Structured view over a connection graph: source node name, then channel
/// name (for example `main`), then output index, then the targets of that
/// output.
pub type ConnectionGraph = IndexMap<String, IndexMap<String, Vec<Vec<ConnectionTarget>>>>;

/// A single edge endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Name of the target node.
    pub node: String,
    /// Channel type on the target, usually `main`.
    #[serde(rename = "type")]
    pub channel: String,
    /// Input index on the target node.
    pub index: u32,
}

/// Raw connection payload, round-tripped verbatim.
///
/// The text is always valid JSON: it either came from the service or was
/// checked by one of the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connections {
    raw: String,
}

impl Connections {
    /// An empty graph (`{}`).
    pub fn empty() -> Self {
        Self { raw: "{}".to_string() }
    }

    /// Wraps already-serialized JSON text after checking it parses.
    pub fn from_raw(raw: impl Into<String>) -> serde_json::Result<Self> {
        let raw = raw.into();
        serde_json::from_str::<IgnoredAny>(&raw)?;
        Ok(Self { raw })
    }

    /// Serializes a structured value into a connection payload.
    pub fn from_value(value: &Value) -> Self {
        Self { raw: value.to_string() }
    }

    /// Raw JSON text exactly as received or supplied.
    pub fn as_raw(&self) -> &str {
        &self.raw
    }

    /// Parses the payload into a generic JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.raw)
    }

    /// Parses the payload into the structured [`ConnectionGraph`] view.
    ///
    /// Fails when the service returns a shape this view does not model.
    pub fn parse(&self) -> serde_json::Result<ConnectionGraph> {
        serde_json::from_str(&self.raw)
    }
}

impl Default for Connections {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for Connections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.raw.clone()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Connections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get();
        if text == "null" {
            return Ok(Self::empty());
        }
        if text.is_empty() {
            return Err(D::Error::custom("empty connection payload"));
        }
        Ok(Self { raw: text.to_string() })
    }
}
