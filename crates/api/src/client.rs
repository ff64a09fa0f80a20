//! Authenticated transport for the n8n public API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{DecodeError, Error, Result};

/// Header carrying the API credential on every call.
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Path prefix of the versioned public API.
pub const API_PREFIX: &str = "/api/v1";

/// A request ready to be handed to [`N8nClient::execute`].
///
/// Paths are relative to `/api/v1`, e.g. `/workflows/abc/activate`.
#[derive(Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    api_key: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            api_key: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serializes `body` as the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the value cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let payload = serde_json::to_vec(body).map_err(|e| Error::request(format!("failed to serialize body: {e}")))?;
        self.body = Some(payload);
        Ok(self)
    }

    /// Sends this request with another credential than the client default.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("has_body", &self.body.is_some())
            .field("api_key_override", &self.api_key.is_some())
            .finish()
    }
}

struct ClientInner {
    http: Client,
    config: ClientConfig,
    timeout: Duration,
}

/// Client for the n8n workflow API.
///
/// Cloning is cheap; clones share the connection pool. The client holds no
/// mutable state, every call is a fresh round trip, and nothing is retried.
#[derive(Clone)]
pub struct N8nClient {
    inner: Arc<ClientInner>,
    api_key: String,
}

impl std::fmt::Debug for N8nClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("N8nClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl N8nClient {
    /// Creates a client after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the host or credential is missing or
    /// invalid, before any network activity.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let timeout = config.effective_timeout();
        debug!(base_url = %config.base_url, timeout_ms = timeout.as_millis() as u64, "creating n8n client");

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.effective_user_agent())
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        let api_key = config.api_key.clone();
        Ok(Self {
            inner: Arc::new(ClientInner { http, config, timeout }),
            api_key,
        })
    }

    /// Creates a client from `N8N_HOST` / `N8N_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Per-request timeout the HTTP client was built with.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Returns a client that authenticates as another principal while sharing
    /// this client's connection pool.
    pub fn with_api_key(&self, api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            api_key: api_key.into(),
        }
    }

    /// Absolute URL for an API-relative path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.inner.config.base_url, API_PREFIX, path)
    }

    /// Sends `request` and returns the raw body of a 200 response.
    ///
    /// The request's own credential takes precedence over the client's. The
    /// body is decoded as UTF-8 (or the charset the response declares);
    /// invalid sequences become U+FFFD, including in [`Error::Status`] bodies.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the effective credential is blank
    /// - [`Error::Request`] if the credential is not a valid header value
    /// - [`Error::Transport`] if the request could not be sent
    /// - [`Error::Body`] if the response body could not be read
    /// - [`Error::Status`] for any status other than 200
    pub async fn execute(&self, request: ApiRequest) -> Result<String> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            api_key,
        } = request;

        let api_key = api_key.as_deref().unwrap_or(&self.api_key);
        if api_key.trim().is_empty() {
            return Err(Error::config("token is required"));
        }
        let mut credential =
            HeaderValue::from_str(api_key).map_err(|e| Error::request(format!("invalid credential: {e}")))?;
        credential.set_sensitive(true);

        let url = self.endpoint(&path);
        debug!(%method, %url, query_params = query.len(), "sending request");

        let mut builder = self
            .inner
            .http
            .request(method.clone(), &url)
            .header(API_KEY_HEADER, credential)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(body) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json").body(body);
        }

        let started_at = Instant::now();
        let response = builder.send().await.map_err(|e| {
            warn!(%method, %url, timeout = e.is_timeout(), connect = e.is_connect(), error = %e, "request failed");
            Error::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!(%method, %url, status = status.as_u16(), error = %e, "failed to read response body");
            Error::Body(e)
        })?;

        debug!(
            %method,
            %url,
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "request completed"
        );

        if status != StatusCode::OK {
            warn!(%method, %url, status = status.as_u16(), "unexpected response status");
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    /// Sends `request` and decodes the JSON response into `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let text = self.execute(request).await?;
        decode_json(&text)
    }
}

/// Strictly decodes a 200 response body.
pub(crate) fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str::<T>(text).map_err(|source| {
        let preview = truncate_response_preview(text, 200);
        Error::Decode(DecodeError::new(format!("status {}", StatusCode::OK), source, preview))
    })
}

fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::config::DEFAULT_TIMEOUT;
    use mockito::Server;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn client_for(url: String) -> N8nClient {
        N8nClient::new(ClientConfig::new(url, "test-token")).unwrap()
    }

    /// Accepts one connection, drains the request head, writes `response`,
    /// then keeps the socket open for `hold` before closing it.
    fn serve_once(response: &'static [u8], hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else { return };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => return,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let _ = stream.write_all(response);
            let _ = stream.flush();
            thread::sleep(hold);
        });
        format!("http://{addr}")
    }

    #[test]
    fn new_rejects_missing_credentials_before_any_request() {
        let err = N8nClient::new(ClientConfig::new("http://example.com", "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);

        let err = N8nClient::new(ClientConfig::new("", "test-token")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn http_client_uses_effective_timeout() {
        assert_eq!(client_for("http://example.com".into()).timeout(), DEFAULT_TIMEOUT);

        let zero = ClientConfig::new("http://example.com", "k").with_timeout(Duration::ZERO);
        assert_eq!(N8nClient::new(zero).unwrap().timeout(), Duration::from_secs(10));

        let short = ClientConfig::new("http://example.com", "k").with_timeout(Duration::from_secs(3));
        assert_eq!(N8nClient::new(short).unwrap().timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn slow_server_times_out_as_transport_error() {
        let url = serve_once(b"", Duration::from_secs(2));
        let config = ClientConfig::new(url, "test-token").with_timeout(Duration::from_millis(200));
        let client = N8nClient::new(config).unwrap();

        let err = client.execute(ApiRequest::get("/test")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        match err {
            Error::Transport(source) => assert!(source.is_timeout()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_body_is_a_body_error() {
        let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"id\"", Duration::ZERO);

        let err = client_for(url).execute(ApiRequest::get("/test")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Body);
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "failed to read response body");
    }

    #[test]
    fn request_builder_records_its_parts() {
        let request = ApiRequest::put("/workflows/abc")
            .query("limit", "10")
            .json(&serde_json::json!({"name": "x"}))
            .unwrap();
        assert_eq!(request.method(), &Method::PUT);
        assert_eq!(request.path(), "/workflows/abc");
        assert_eq!(request.query_pairs(), [("limit".to_string(), "10".to_string())]);
        assert_eq!(request.body(), Some(br#"{"name":"x"}"#.as_slice()));
        assert!(ApiRequest::delete("/x").body().is_none());
    }

    #[test]
    fn endpoint_joins_prefix() {
        let client = client_for("http://example.com/".into());
        assert_eq!(client.endpoint("/workflows"), "http://example.com/api/v1/workflows");
    }

    #[tokio::test]
    async fn execute_sends_credential_and_returns_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/test")
            .match_header(API_KEY_HEADER, "test-token")
            .with_status(200)
            .with_body(r#"{"message": "success"}"#)
            .create_async()
            .await;

        let body = client_for(server.url()).execute(ApiRequest::get("/test")).await.unwrap();
        assert_eq!(body, r#"{"message": "success"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn request_credential_overrides_client_default() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/test")
            .match_header(API_KEY_HEADER, "other-principal")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(server.url());
        client
            .execute(ApiRequest::post("/test").api_key("other-principal"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn with_api_key_switches_principal() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/test")
            .match_header(API_KEY_HEADER, "second")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(server.url()).with_api_key("second");
        client.execute(ApiRequest::get("/test")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn blank_override_fails_without_network_call() {
        let mut server = Server::new_async().await;
        let mock = server.mock("GET", "/api/v1/test").expect(0).create_async().await;

        let err = client_for(server.url())
            .execute(ApiRequest::get("/test").api_key(" "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_status_carries_code_and_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/test")
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let err = client_for(server.url()).execute(ApiRequest::get("/test")).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.body(), Some("bad request"));
        assert!(err.to_string().contains("status: 400"));
        assert!(err.to_string().contains("bad request"));
    }

    #[tokio::test]
    async fn other_success_codes_are_still_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/test")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let err = client_for(server.url()).execute(ApiRequest::post("/test")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status(), Some(201));
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let client = client_for("http://127.0.0.1:1".into());
        let err = client.execute(ApiRequest::get("/test")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "request failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn invalid_utf8_in_status_body_is_replaced() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/test")
            .with_status(502)
            .with_body(vec![b'b', b'a', b'd', 0xff])
            .create_async()
            .await;

        let err = client_for(server.url()).execute(ApiRequest::get("/test")).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.body(), Some("bad\u{FFFD}"));
    }

    #[tokio::test]
    async fn json_body_sets_content_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/test")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::JsonString(r#"{"name":"x"}"#.into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let request = ApiRequest::put("/test").json(&serde_json::json!({"name": "x"})).unwrap();
        client_for(server.url()).execute(request).await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn unserializable_body_is_a_construction_error() {
        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "tuple keys have no JSON form");
        let err = ApiRequest::post("/test").json(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn decode_reports_preview() {
        let err = decode_json::<serde_json::Value>("not\njson").unwrap_err();
        match err {
            Error::Decode(decode) => assert_eq!(decode.body_preview(), "not json"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn preview_is_truncated() {
        let long = "x".repeat(500);
        let preview = truncate_response_preview(&long, 200);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), 203);
        assert_eq!(truncate_response_preview("  ", 200), "<empty>");
    }
}
