//! Error taxonomy for the n8n API client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client.
///
/// Nothing is retried or swallowed: each variant reaches the immediate caller
/// with enough context to tell the failure classes apart (see [`ErrorKind`]).
#[derive(Debug, Error)]
pub enum Error {
    /// The client configuration is incomplete or invalid.
    #[error("{0}")]
    Config(String),

    /// The request could not be constructed.
    #[error("failed to build request: {0}")]
    Request(String),

    /// Connection, DNS or timeout failure while sending.
    #[error("request failed")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read response body")]
    Body(#[source] reqwest::Error),

    /// The service answered with a status other than 200.
    #[error("status: {status}, body: {body}")]
    Status { status: u16, body: String },

    /// The response body is not the JSON the operation expects.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A parameter or connection value could not be serialized.
    #[error("translation failed: {0}")]
    Translation(String),
}

/// Coarse classification of an [`Error`] for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Construction,
    Transport,
    Body,
    Status,
    Decode,
    Translation,
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a request construction error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Create a translation error.
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Request(_) => ErrorKind::Construction,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Body(_) => ErrorKind::Body,
            Self::Status { .. } => ErrorKind::Status,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Translation(_) => ErrorKind::Translation,
        }
    }

    /// HTTP status of a non-200 response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw body of a non-200 response.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for a 404 response. The client itself never treats 404 specially.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Error returned when a response body does not decode into the expected type.
#[derive(Debug, Error)]
#[error("failed to decode response ({status_note}): {source}. body preview: {body_preview}")]
pub struct DecodeError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl DecodeError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Truncated, whitespace-collapsed view of the offending body.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }

    /// The underlying serde error.
    pub fn source_error(&self) -> &serde_json::Error {
        &self.source
    }
}
