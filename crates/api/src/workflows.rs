//! Workflow resource operations.

use std::num::NonZeroUsize;

use n8n_types::{Workflow, WorkflowDraft, WorkflowPage};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use crate::client::{ApiRequest, N8nClient};
use crate::error::Result;

const WORKFLOWS_PATH: &str = "/workflows";

/// Optional filters and bounds for listing workflows.
///
/// The default sends no filter and follows the cursor chain until the service
/// stops returning one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListWorkflows {
    /// Page size requested from the service.
    pub limit: Option<u32>,
    pub active: Option<bool>,
    /// Tag names; sent comma separated.
    pub tags: Vec<String>,
    pub name: Option<String>,
    /// Stop after this many pages even if a cursor remains.
    pub max_pages: Option<NonZeroUsize>,
}

impl ListWorkflows {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn max_pages(mut self, max_pages: NonZeroUsize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(limit) = self.limit {
            request = request.query("limit", limit.to_string());
        }
        if let Some(active) = self.active {
            request = request.query("active", active.to_string());
        }
        if !self.tags.is_empty() {
            request = request.query("tags", self.tags.join(","));
        }
        if let Some(name) = &self.name {
            request = request.query("name", name.clone());
        }
        request
    }
}

/// Result of following the listing cursor chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowList {
    /// Items of every fetched page, in request order.
    pub data: Vec<Workflow>,
    /// Unconsumed cursor when `max_pages` cut the chain short.
    pub next_cursor: Option<String>,
}

impl WorkflowList {
    /// True when every page was fetched.
    pub fn is_complete(&self) -> bool {
        self.next_cursor.is_none()
    }
}

fn workflow_path(id: &str) -> String {
    format!("{WORKFLOWS_PATH}/{}", utf8_percent_encode(id, NON_ALPHANUMERIC))
}

impl N8nClient {
    /// Lists every workflow, following the cursor until the service returns
    /// none.
    ///
    /// There is no page bound here; a service that never stops returning a
    /// cursor keeps this call looping. Use [`N8nClient::list_workflows_with`]
    /// with `max_pages` to cap it.
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        self.list_workflows_with(&ListWorkflows::default())
            .await
            .map(|list| list.data)
    }

    /// Lists workflows with filters, optionally bounded by `max_pages`.
    ///
    /// Pages are requested one after another and their items appended in
    /// order without de-duplication. Any failure aborts the whole listing.
    pub async fn list_workflows_with(&self, options: &ListWorkflows) -> Result<WorkflowList> {
        let mut data = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.list_workflows_page(cursor.as_deref(), options).await?;
            pages += 1;
            data.extend(page.data);

            // Only `null` ends the chain; any other token, even empty, is sent back.
            let Some(next) = page.next_cursor else {
                debug!(pages, workflows = data.len(), "listing complete");
                return Ok(WorkflowList { data, next_cursor: None });
            };

            if options.max_pages.is_some_and(|max| pages >= max.get()) {
                debug!(pages, workflows = data.len(), "page bound reached with cursor remaining");
                return Ok(WorkflowList {
                    data,
                    next_cursor: Some(next),
                });
            }

            cursor = Some(next);
        }
    }

    /// Fetches a single page of the listing.
    ///
    /// `cursor` is omitted from the query when `None`.
    pub async fn list_workflows_page(&self, cursor: Option<&str>, options: &ListWorkflows) -> Result<WorkflowPage> {
        let mut request = options.apply(ApiRequest::get(WORKFLOWS_PATH));
        if let Some(cursor) = cursor {
            request = request.query("cursor", cursor);
        }
        self.execute_json(request).await
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Workflow> {
        self.execute_json(ApiRequest::get(workflow_path(id))).await
    }

    /// Creates a workflow. The returned value carries the server-assigned id.
    pub async fn create_workflow(&self, draft: &WorkflowDraft) -> Result<Workflow> {
        let request = ApiRequest::post(WORKFLOWS_PATH).json(draft)?;
        self.execute_json(request).await
    }

    /// Replaces the workflow identified by `id` with `draft`.
    pub async fn update_workflow(&self, id: &str, draft: &WorkflowDraft) -> Result<Workflow> {
        let request = ApiRequest::put(workflow_path(id)).json(draft)?;
        self.execute_json(request).await
    }

    /// Deletes a workflow and returns its final state.
    pub async fn delete_workflow(&self, id: &str) -> Result<Workflow> {
        self.execute_json(ApiRequest::delete(workflow_path(id))).await
    }

    pub async fn activate_workflow(&self, id: &str) -> Result<Workflow> {
        self.execute_json(ApiRequest::post(format!("{}/activate", workflow_path(id))))
            .await
    }

    pub async fn deactivate_workflow(&self, id: &str) -> Result<Workflow> {
        self.execute_json(ApiRequest::post(format!("{}/deactivate", workflow_path(id))))
            .await
    }
}
