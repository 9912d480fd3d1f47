//! Streaming client configuration.
//!
//! Use the builder pattern to customize the client.
//!
//! # Example
//!
//! ```ignore
//! use chatstream::config::StreamClientConfig;
//!
//! let config = StreamClientConfig::default()
//!     .with_base_url("https://support.example.com/api")
//!     .with_token_path("/auth/stream-token");
//! ```

use crate::error::{StreamError, StreamResult};

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default token exchange path, relative to the base URL.
pub const DEFAULT_TOKEN_PATH: &str = "/auth/stream-token";

/// Default name of the token field, in the POST body and in the query string.
pub const DEFAULT_TOKEN_FIELD: &str = "stream_token";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "CHATSTREAM_BASE_URL";

/// Environment variable overriding the token path.
pub const TOKEN_PATH_ENV: &str = "CHATSTREAM_TOKEN_PATH";

/// Configuration for [`StreamClient`](crate::stream::StreamClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClientConfig {
    /// Base URL that relative endpoints are joined onto
    pub base_url: String,
    /// Path of the stream token exchange endpoint
    pub token_path: String,
    /// JSON body field the stream token is injected into (POST path)
    pub token_field: String,
    /// Query parameter the stream token is appended as (GET path)
    pub token_query_param: String,
}

impl Default for StreamClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            token_query_param: DEFAULT_TOKEN_FIELD.to_string(),
        }
    }
}

impl StreamClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
        self.token_field = field.into();
        self
    }

    pub fn with_token_query_param(mut self, param: impl Into<String>) -> Self {
        self.token_query_param = param.into();
        self
    }

    /// Defaults overridden by `CHATSTREAM_BASE_URL` and `CHATSTREAM_TOKEN_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_empty_env(BASE_URL_ENV) {
            config = config.with_base_url(url);
        }
        if let Some(path) = non_empty_env(TOKEN_PATH_ENV) {
            config = config.with_token_path(path);
        }
        config
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> StreamResult<()> {
        if !is_absolute_url(&self.base_url) {
            return Err(StreamError::Config {
                message: format!("base URL must start with http:// or https://: {}", self.base_url),
            });
        }
        if self.token_field.is_empty() || self.token_query_param.is_empty() {
            return Err(StreamError::Config {
                message: "token field names must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve an endpoint against the base URL.
    ///
    /// Absolute `http(s)://` endpoints are returned unchanged.
    pub fn resolve(&self, endpoint: &str) -> String {
        if is_absolute_url(endpoint) {
            return endpoint.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    /// Full URL of the token exchange endpoint.
    pub fn token_url(&self) -> String {
        self.resolve(&self.token_path)
    }
}

fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
