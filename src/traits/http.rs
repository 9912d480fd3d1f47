//! HTTP client trait abstraction.
//!
//! The token exchange and the POST/fetch transport both go through
//! [`HttpClient`], so tests can swap in a scripted client.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use thiserror::Error;

/// Request headers by name.
pub type Headers = HashMap<String, String>;

/// A response body delivered incrementally.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: Bytes) -> Self {
        Self { status, body }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Parse the body as JSON, treating a response with no content as `{}`.
    ///
    /// Only whole-response bodies get this defaulting. Stream frames never do.
    pub fn json_or_empty<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.status == 204 || self.body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_str("{}")
        } else {
            self.json()
        }
    }
}

/// Failures of the HTTP seam.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Non-2xx status on a streaming request, with the error body
    #[error("status {status}: {message}")]
    ServerError { status: u16, message: String },
    /// The read was aborted on purpose
    #[error("request cancelled")]
    Cancelled,
    #[error("read failed: {0}")]
    Io(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    /// Whether this error is the expected result of a deliberate cancellation.
    ///
    /// Readers report cancellation through their error message, so the text
    /// is inspected as well as the variant.
    pub fn is_cancellation(&self) -> bool {
        if matches!(self, HttpError::Cancelled) {
            return true;
        }
        let message = self.to_string().to_lowercase();
        message.contains("aborted") || message.contains("cancelled") || message.contains("canceled")
    }
}

/// POST requests, buffered or streamed.
///
/// Implementations are the production reqwest-based client and
/// [`MockHttpClient`](crate::adapters::mock::MockHttpClient) for tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a POST request and buffer the whole response.
    ///
    /// Non-success statuses are returned as a [`Response`], not an error.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a POST request and return the body as a byte stream.
    ///
    /// A non-success status must be returned as [`HttpError::ServerError`]
    /// carrying the error body, before any chunk is yielded.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError>;
}
