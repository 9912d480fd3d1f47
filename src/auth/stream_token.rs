//! Stream token exchange.
//!
//! Trades the durable session credential for a short-lived token scoped to
//! one streaming call, so the durable credential never has to travel in a
//! URL. The exchange is best effort: any failure yields `None` and the
//! caller falls back to header auth.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::traits::{Headers, HttpClient};

/// A single-use stream token. Never persisted, never logged.
#[derive(Clone)]
pub struct StreamToken {
    value: String,
    issued_at: DateTime<Utc>,
}

impl StreamToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Consume the token, yielding its value for the one request it is for.
    pub fn into_value(self) -> String {
        self.value
    }
}

impl std::fmt::Debug for StreamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Response from the token exchange endpoint.
#[derive(Debug, Deserialize)]
struct StreamTokenResponse {
    #[serde(default)]
    stream_token: Option<String>,
}

/// Exchanges durable credentials for stream tokens.
///
/// Stateless: each call performs exactly one request and nothing is cached.
pub struct TokenBroker<H: HttpClient> {
    http: Arc<H>,
    token_url: String,
}

impl<H: HttpClient> TokenBroker<H> {
    pub fn new(http: Arc<H>, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Exchange `durable` for a stream token.
    ///
    /// Returns `None` without a request when there is no durable credential,
    /// and `None` on any failure. Never returns an error.
    pub async fn exchange_token(&self, durable: Option<&str>) -> Option<StreamToken> {
        let durable = match durable {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!("No session credential, skipping stream token exchange");
                return None;
            }
        };

        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Authorization".to_string(), format!("Bearer {}", durable));

        let response = match self.http.post(&self.token_url, "{}", &headers).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Stream token exchange failed, falling back to header auth");
                return None;
            }
        };

        if !response.is_success() {
            warn!(
                status = response.status,
                "Stream token exchange rejected, falling back to header auth"
            );
            return None;
        }

        match response.json_or_empty::<StreamTokenResponse>() {
            Ok(StreamTokenResponse {
                stream_token: Some(value),
            }) if !value.is_empty() => {
                debug!("Obtained stream token");
                Some(StreamToken::new(value))
            }
            Ok(_) => {
                warn!("Stream token response had no token, falling back to header auth");
                None
            }
            Err(e) => {
                warn!(error = %e, "Malformed stream token response, falling back to header auth");
                None
            }
        }
    }
}
