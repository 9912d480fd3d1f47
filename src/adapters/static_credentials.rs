//! Fixed in-memory credentials.

use async_trait::async_trait;

use crate::traits::{CredentialsError, CredentialsProvider};

/// Environment variable holding a durable access token.
pub const ACCESS_TOKEN_ENV: &str = "CHATSTREAM_ACCESS_TOKEN";

/// A [`CredentialsProvider`] that always returns the same token.
///
/// Used by embedders that already hold the session token, and in tests.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    access_token: Option<String>,
}

impl StaticCredentials {
    /// Credentials carrying `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    /// No session at all.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Read the token from `CHATSTREAM_ACCESS_TOKEN`, if set and non-empty.
    pub fn from_env() -> Self {
        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self { access_token }
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn access_token(&self) -> Result<Option<String>, CredentialsError> {
        Ok(self.access_token.clone())
    }
}
