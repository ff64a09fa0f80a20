//! Flattened attribute models for declarative consumers.
//!
//! A consumer that stores workflows in a fixed, snake_case attribute schema
//! reads them through [`workflow_state`]. Parameters become typed string
//! triples and connections become compact JSON text.

use chrono::{DateTime, SecondsFormat, Utc};
use n8n_api::Result;
use n8n_types::{Meta, Node, Settings, Tag, Workflow};
use serde::Serialize;
use tracing::warn;

use crate::translate::{TypedParameter, canonicalize_connections, translate_node_parameters};

/// Attribute view of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub version_id: String,
    pub trigger_count: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub nodes: Vec<NodeState>,
    /// Compact JSON text of the connection graph.
    pub connections: String,
    pub settings: SettingsState,
    pub meta: MetaState,
    pub tags: Vec<TagState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub type_version: f64,
    pub position: [i64; 2],
    pub parameters: Vec<TypedParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsState {
    pub save_execution_progress: Option<bool>,
    pub save_manual_executions: Option<bool>,
    pub save_data_error_execution: Option<String>,
    pub save_data_success_execution: Option<String>,
    pub execution_timeout: Option<i64>,
    pub error_workflow: Option<String>,
    pub timezone: Option<String>,
    pub execution_order: Option<String>,
    pub caller_policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaState {
    pub template_creds_setup_completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagState {
    pub id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Converts a workflow into its attribute view.
///
/// A node whose parameters cannot be translated is left out and logged; the
/// rest of the workflow is still returned. Connections that cannot be
/// re-serialized fail the whole conversion.
pub fn workflow_state(workflow: &Workflow) -> Result<WorkflowState> {
    let nodes = workflow
        .nodes
        .iter()
        .filter_map(|node| match node_state(node) {
            Ok(state) => Some(state),
            Err(error) => {
                warn!(
                    workflow_id = %workflow.id,
                    node = %node.name,
                    error = %error,
                    "skipping node with untranslatable parameters"
                );
                None
            }
        })
        .collect();

    Ok(WorkflowState {
        id: workflow.id.clone(),
        name: workflow.name.clone(),
        active: workflow.active,
        version_id: workflow.version_id.clone(),
        trigger_count: workflow.trigger_count,
        created_at: workflow.created_at.as_ref().map(format_timestamp),
        updated_at: workflow.updated_at.as_ref().map(format_timestamp),
        nodes,
        connections: canonicalize_connections(&workflow.connections)?,
        settings: SettingsState::from(&workflow.settings),
        meta: MetaState::from(&workflow.meta),
        tags: workflow.tags.iter().map(TagState::from).collect(),
    })
}

/// Converts every workflow, stopping at the first failure.
pub fn workflow_states(workflows: &[Workflow]) -> Result<Vec<WorkflowState>> {
    workflows.iter().map(workflow_state).collect()
}

fn node_state(node: &Node) -> Result<NodeState> {
    Ok(NodeState {
        id: node.id.clone(),
        name: node.name.clone(),
        node_type: node.node_type.clone(),
        type_version: node.type_version,
        position: node.position,
        parameters: translate_node_parameters(&node.parameters)?,
    })
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&Settings> for SettingsState {
    fn from(settings: &Settings) -> Self {
        Self {
            save_execution_progress: settings.save_execution_progress,
            save_manual_executions: settings.save_manual_executions,
            save_data_error_execution: settings.save_data_error_execution.clone(),
            save_data_success_execution: settings.save_data_success_execution.clone(),
            execution_timeout: settings.execution_timeout,
            error_workflow: settings.error_workflow.clone(),
            timezone: settings.timezone.clone(),
            execution_order: settings.execution_order.clone(),
            caller_policy: settings.caller_policy.clone(),
        }
    }
}

impl From<&Meta> for MetaState {
    fn from(meta: &Meta) -> Self {
        Self {
            template_creds_setup_completed: meta.template_creds_setup_completed,
        }
    }
}

impl From<&Tag> for TagState {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.name.clone(),
            created_at: tag.created_at.as_ref().map(format_timestamp),
            updated_at: tag.updated_at.as_ref().map(format_timestamp),
        }
    }
}
