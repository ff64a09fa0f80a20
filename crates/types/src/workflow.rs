//! Workflow resources as read from and written to the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::null_as_default;
use crate::{Connections, Node};

/// A workflow as returned by the service (current state).
///
/// Every field defaults when absent or `null`, so sparse payloads decode. A
/// value of this type always reflects the server's canonical form, never the
/// request that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workflow {
    /// Server-assigned identifier, immutable once created.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Only changed through the activate/deactivate operations.
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    /// Changes on every mutation.
    #[serde(deserialize_with = "null_as_default")]
    pub version_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trigger_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
    pub connections: Connections,
    #[serde(deserialize_with = "null_as_default")]
    pub settings: Settings,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: Meta,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
}

impl Workflow {
    /// Finds a node by its display name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }
}

/// Execution policy of a workflow.
///
/// Every field is optional for the caller; unset fields are omitted from
/// request bodies and the server echoes back what it applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_execution_progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_manual_executions: Option<bool>,
    /// Retention of failed executions: `all` or `none`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_data_error_execution: Option<String>,
    /// Retention of successful executions: `all` or `none`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_data_success_execution: Option<String>,
    /// Upper bound on a single execution, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_timeout: Option<i64>,
    /// Identifier of the workflow holding the error trigger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_workflow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Node execution ordering mode, for example `v1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_policy: Option<String>,
    /// Settings keys not modelled above, carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn with_execution_order(mut self, order: impl Into<String>) -> Self {
        self.execution_order = Some(order.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_execution_timeout(mut self, seconds: i64) -> Self {
        self.execution_timeout = Some(seconds);
        self
    }
}

/// Auxiliary editor flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_creds_setup_completed: Option<bool>,
}

/// Read-only label attached to a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of the workflow listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Workflow>,
    /// Cursor for the next page; `None` on the last page.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Complete desired state of a workflow, sent by create and update.
///
/// Workflow-level fields outside this set (`pinData`, `staticData`, tags,
/// `active`) are not part of a replacement. Node and settings keys the model
/// does not name travel in their `extra` maps.
///
/// Updates replace the whole workflow, so there is no `Default`: every field
/// has to be supplied when the value is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDraft {
    pub name: String,
    pub nodes: Vec<Node>,
    pub connections: Connections,
    pub settings: Settings,
}

impl WorkflowDraft {
    pub fn new(name: impl Into<String>, nodes: Vec<Node>, connections: Connections, settings: Settings) -> Self {
        Self {
            name: name.into(),
            nodes,
            connections,
            settings,
        }
    }
}

impl From<&Workflow> for WorkflowDraft {
    fn from(workflow: &Workflow) -> Self {
        Self {
            name: workflow.name.clone(),
            nodes: workflow.nodes.clone(),
            connections: workflow.connections.clone(),
            settings: workflow.settings.clone(),
        }
    }
}

impl From<Workflow> for WorkflowDraft {
    fn from(workflow: Workflow) -> Self {
        Self {
            name: workflow.name,
            nodes: workflow.nodes,
            connections: workflow.connections,
            settings: workflow.settings,
        }
    }
}
