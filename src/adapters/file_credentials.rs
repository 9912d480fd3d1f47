//! Session credential read from disk.
//!
//! Reads the session written by the host application's login flow from
//! `~/.chatstream/credentials.json`. The file is never written here.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::traits::{CredentialsError, CredentialsProvider};

const CREDENTIALS_DIR: &str = ".chatstream";
const CREDENTIALS_FILE: &str = "credentials.json";

/// On-disk session format. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
struct StoredSession {
    #[serde(default)]
    access_token: Option<String>,
}

/// Reads the access token from a JSON session file.
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    credentials_path: PathBuf,
}

impl FileCredentialsProvider {
    /// Provider for `~/.chatstream/credentials.json`.
    pub fn new() -> Result<Self, CredentialsError> {
        let home = dirs::home_dir().ok_or(CredentialsError::NoHomeDirectory)?;
        Ok(Self::with_path(home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE)))
    }

    /// Provider reading from an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: path.into(),
        }
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn access_token(&self) -> Result<Option<String>, CredentialsError> {
        let contents = match tokio::fs::read_to_string(&self.credentials_path).await {
            Ok(contents) => contents,
            // No file means no session, not a failure.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialsError::Io(e.to_string())),
        };

        let session: StoredSession = serde_json::from_str(&contents)
            .map_err(|e| CredentialsError::Serialization(e.to_string()))?;

        Ok(session.access_token.filter(|token| !token.is_empty()))
    }
}
