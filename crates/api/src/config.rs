//! Client configuration: service host, credential and request bounds.

use std::env;
use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

/// Environment variable holding the service host URL.
pub const HOST_ENV: &str = "N8N_HOST";
/// Environment variable holding the API credential.
pub const TOKEN_ENV: &str = "N8N_TOKEN";
/// Environment variable overriding the request timeout, in whole seconds.
pub const TIMEOUT_ENV: &str = "N8N_TIMEOUT_SECS";

/// Default bound on a single request, body download included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`N8nClient`](crate::N8nClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the service, without the `/api/v1` suffix.
    pub base_url: String,
    /// Credential sent in the `X-N8N-API-KEY` header.
    pub api_key: String,
    /// Per-request timeout. Zero falls back to [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,
    /// User-Agent header. Empty falls back to the crate default.
    pub user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: Self::default_user_agent(),
        }
    }

    /// Builds a configuration from optional parts.
    ///
    /// The credential is checked before the host, so a call with neither
    /// reports the missing token.
    pub fn from_parts(base_url: Option<String>, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| Error::config("token is required"))?;
        let base_url = base_url.ok_or_else(|| Error::config("host is required"))?;
        Ok(Self::new(base_url, api_key))
    }

    /// Reads `N8N_HOST`, `N8N_TOKEN` and the optional `N8N_TIMEOUT_SECS`.
    ///
    /// Blank values count as missing.
    pub fn from_env() -> Result<Self> {
        let host = non_blank_env(HOST_ENV);
        let token = non_blank_env(TOKEN_ENV);
        let mut config = Self::from_parts(host, token)?;

        if let Some(raw) = non_blank_env(TIMEOUT_ENV) {
            let seconds: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{TIMEOUT_ENV} must be a whole number of seconds, got '{raw}'")))?;
            config.timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }

    fn default_user_agent() -> String {
        format!("n8n-api/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() { DEFAULT_TIMEOUT } else { self.timeout }
    }

    /// Returns the effective user agent, using the default if empty.
    pub fn effective_user_agent(&self) -> String {
        if self.user_agent.is_empty() {
            Self::default_user_agent()
        } else {
            self.user_agent.clone()
        }
    }

    /// Checks that a request could be sent with this configuration.
    ///
    /// Rules:
    /// - the credential must be non-empty
    /// - the host must be non-empty, parse as a URL, use `http` or `https`,
    ///   and include a host name
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("token is required"));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::config("host is required"));
        }
        validate_base_url(&self.base_url)
    }
}

fn validate_base_url(base: &str) -> Result<()> {
    let parsed = Url::parse(base).map_err(|e| Error::config(format!("invalid host URL '{base}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "host URL must use http or https; got '{}://'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::config(format!("host URL '{base}' must include a host")));
    }

    Ok(())
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
