//! Streaming error taxonomy.
//!
//! Four classes matter to callers:
//!
//! - **Initialization** errors happen before any byte is dispatched and are
//!   returned from `StreamClient::stream` itself.
//! - **Transport** errors happen mid-stream. They are reported once through
//!   `on_error` and the handle then closes.
//! - **InvalidJson** errors are per-frame. They are reported through
//!   `on_error` and the stream keeps going.
//! - **Cancelled** is what a read returns after `close()`. It is never
//!   delivered to `on_error`.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Errors produced by the streaming client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Non-success status (or connection failure) before the stream opened.
    #[error("stream request failed ({status}): {message}")]
    Initialization { status: u16, message: String },

    /// The transport failed after the stream opened.
    #[error("stream transport error: {message}")]
    Transport { message: String },

    /// One `data:` payload was not valid JSON.
    #[error("invalid JSON in data frame: {message}")]
    InvalidJson { payload: String, message: String },

    /// The stream was cancelled by the caller.
    #[error("stream cancelled")]
    Cancelled,

    /// The durable credential could not be loaded.
    #[error("credentials unavailable: {message}")]
    Credentials { message: String },

    /// The endpoint could not be turned into a request URL.
    #[error("invalid stream URL: {url}")]
    InvalidUrl { url: String },

    /// Invalid client configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl StreamError {
    /// Status code used for initialization failures that never got a response.
    pub const NO_STATUS: u16 = 0;

    /// High-level category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Initialization { status, .. } => match *status {
                401 | 403 => ErrorCategory::Auth,
                s if s >= 500 => ErrorCategory::Server,
                StreamError::NO_STATUS => ErrorCategory::Network,
                _ => ErrorCategory::Protocol,
            },
            StreamError::Transport { .. } => ErrorCategory::Network,
            StreamError::InvalidJson { .. } => ErrorCategory::Protocol,
            StreamError::Cancelled => ErrorCategory::Cancelled,
            StreamError::Credentials { .. } => ErrorCategory::Auth,
            StreamError::InvalidUrl { .. } | StreamError::Config { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Whether this error ends the stream it occurred on.
    ///
    /// Per-frame parse errors are the only non-fatal class.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StreamError::InvalidJson { .. })
    }

    /// Advisory only: the client never retries by itself.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Initialization { .. } => "E_STREAM_INIT",
            StreamError::Transport { .. } => "E_STREAM_CONN",
            StreamError::InvalidJson { .. } => "E_STREAM_JSON",
            StreamError::Cancelled => "E_STREAM_CANCELLED",
            StreamError::Credentials { .. } => "E_STREAM_CREDS",
            StreamError::InvalidUrl { .. } => "E_STREAM_URL",
            StreamError::Config { .. } => "E_STREAM_CONFIG",
        }
    }

    /// User-facing message suitable for a chat UI.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Initialization { status, .. } if *status == 401 || *status == 403 => {
                "Your session is not authorized to chat. Please sign in again.".to_string()
            }
            StreamError::Initialization { status, message } => {
                if *status == StreamError::NO_STATUS {
                    format!("Could not reach the chat server: {}", message)
                } else {
                    format!("The chat server rejected the request ({}).", status)
                }
            }
            StreamError::Transport { .. } => {
                "The connection to the chat server was lost.".to_string()
            }
            StreamError::InvalidJson { .. } => {
                "Received a malformed message from the server.".to_string()
            }
            StreamError::Cancelled => "The response was cancelled.".to_string(),
            StreamError::Credentials { .. } => "Could not load your session.".to_string(),
            StreamError::InvalidUrl { url } => format!("Invalid chat endpoint: {}", url),
            StreamError::Config { message } => format!("Client misconfigured: {}", message),
        }
    }
}

impl From<HttpError> for StreamError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ServerError { status, message } => {
                StreamError::Initialization { status, message }
            }
            HttpError::Cancelled => StreamError::Cancelled,
            HttpError::InvalidUrl(url) => StreamError::InvalidUrl { url },
            other => StreamError::Initialization {
                status: StreamError::NO_STATUS,
                message: other.to_string(),
            },
        }
    }
}
