//! Source of the durable session credential.
//!
//! The streaming client only ever reads the credential. Refreshing and
//! storing it belong to the host application's session management.

use async_trait::async_trait;
use thiserror::Error;

/// Why the durable credential could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// No home directory to look for the session file in
    #[error("home directory could not be determined")]
    NoHomeDirectory,
    /// The session store exists but could not be read
    #[error("could not read session: {0}")]
    Io(String),
    /// The session store could not be parsed
    #[error("malformed session: {0}")]
    Serialization(String),
}

/// Read-only access to the durable session credential.
///
/// `Ok(None)` means there is no session and requests go out without
/// credentials. `Err` means a session store exists but is unusable.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>, CredentialsError>;
}
