//! n8n workflow API client.
//!
//! This crate provides a typed client for the workflow endpoints of the n8n
//! public REST API. It focuses on:
//!
//! - Validating the host and credential before any request is built
//! - Authenticating every call with the `X-N8N-API-KEY` header
//! - Following the listing cursor chain in request order
//! - Classifying failures (construction, transport, status, decode) without
//!   retrying or swallowing any of them
//!
//! The primary entry point is [`N8nClient`]. Build one from a
//! [`ClientConfig`] and call the workflow operations on it.
//!
//! # Example
//!
//! ```ignore
//! use n8n_api::{ClientConfig, N8nClient};
//!
//! async fn run() -> n8n_api::Result<()> {
//!     let client = N8nClient::new(ClientConfig::new("http://localhost:5678", "my-api-key"))?;
//!     for workflow in client.list_workflows().await? {
//!         println!("{} {}", workflow.id, workflow.name);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod workflows;

pub use client::{API_KEY_HEADER, API_PREFIX, ApiRequest, N8nClient};
pub use config::{ClientConfig, DEFAULT_TIMEOUT, HOST_ENV, TIMEOUT_ENV, TOKEN_ENV};
pub use error::{DecodeError, Error, ErrorKind, Result};
pub use workflows::{ListWorkflows, WorkflowList};

pub use n8n_types as types;
pub use reqwest::Method;
