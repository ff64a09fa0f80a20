//! Strongly typed models for the n8n workflow REST API.
//!
//! The types here describe what the service returns (the "current state" read
//! model, [`Workflow`]) and what a caller sends when creating or replacing a
//! workflow (the "desired state", [`WorkflowDraft`]). Nothing in this crate
//! performs I/O.
//!
//! Two payloads are deliberately kept loose:
//!
//! - node parameters, whose values are classified once into [`ParameterValue`]
//!   when the JSON is decoded, and
//! - connection graphs, which are kept as raw JSON text ([`Connections`])
//!   because their shape depends on the node topology.

mod connections;
mod node;
mod workflow;

pub use connections::{ConnectionGraph, ConnectionTarget, Connections};
pub use node::{Node, NodeParameters, ParameterValue};
pub use workflow::{Meta, Settings, Tag, Workflow, WorkflowDraft, WorkflowPage};

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
