//! Error category classification.
//!
//! Categories let collaborators decide what to do with a failure without
//! matching on every [`StreamError`](super::StreamError) variant. This crate
//! never retries on its own; the retry hint is advisory for the caller.

use std::fmt;

/// High-level categorization of streaming errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection dropped, DNS, refused connection.
    Network,

    /// Authentication or authorization rejected by the backend.
    Auth,

    /// Backend returned a 5xx or otherwise failed server-side.
    Server,

    /// The backend sent data this client could not understand.
    Protocol,

    /// Caller-initiated cancellation. Expected, not exceptional.
    Cancelled,

    /// Missing or invalid local configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if the caller may reasonably retry the whole stream.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
