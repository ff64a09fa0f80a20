//! Helpers for consumers that need n8n workflows in a fixed-type shape.
//!
//! - [`translate`] flattens loosely typed node parameters into typed string
//!   triples and renders connection graphs as compact JSON.
//! - [`adapter`] builds snake_case attribute models on top of it.

pub mod adapter;
pub mod translate;

pub use adapter::{
    MetaState, NodeState, SettingsState, TagState, WorkflowState, format_timestamp, workflow_state, workflow_states,
};
pub use translate::{
    ParameterKind, TypedParameter, canonicalize_connections, to_canonical_json, translate_node_parameters,
    translate_parameters,
};
