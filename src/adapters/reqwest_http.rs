//! Reqwest-based [`HttpClient`] for the token exchange and streaming POSTs.
//!
//! Streams are long-lived, so only connecting is bounded in time. A
//! silent server keeps a stream open until the caller closes it.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// Upper bound on establishing the TCP/TLS connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP keepalive interval for idle stream connections.
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

const EVENT_STREAM: &str = "text/event-stream";

/// [`HttpClient`] backed by a shared `reqwest::Client`.
///
/// Dropping a stream returned by [`post_stream`](HttpClient::post_stream)
/// aborts the body read and releases the connection.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    fn request(&self, url: &str, body: &str, headers: &Headers) -> reqwest::RequestBuilder {
        headers
            .iter()
            .fold(self.client.post(url).body(body.to_string()), |builder, (k, v)| {
                builder.header(k, v)
            })
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a reqwest failure onto the seam's error type.
///
/// Reads aborted on purpose come back as `Cancelled`, so the read loop
/// never reports them.
fn convert_error(err: reqwest::Error) -> HttpError {
    let converted = if err.is_timeout() {
        HttpError::Timeout(err.to_string())
    } else if err.is_connect() {
        HttpError::ConnectionFailed(err.to_string())
    } else if err.is_builder() {
        HttpError::InvalidUrl(err.to_string())
    } else if err.is_body() || err.is_decode() {
        HttpError::Io(err.to_string())
    } else {
        HttpError::Other(err.to_string())
    };
    cancellation_aware(converted)
}

fn cancellation_aware(err: HttpError) -> HttpError {
    match err {
        HttpError::Cancelled => HttpError::Cancelled,
        err if err.is_cancellation() => HttpError::Cancelled,
        err => err,
    }
}

/// Streaming request headers: caller headers plus an event-stream `Accept`
/// unless the caller chose one.
fn stream_headers(headers: &Headers) -> Headers {
    let mut headers = headers.clone();
    if !headers.keys().any(|k| k.eq_ignore_ascii_case("accept")) {
        headers.insert("Accept".to_string(), EVENT_STREAM.to_string());
    }
    headers
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let response = self
            .request(url, body, headers)
            .send()
            .await
            .map_err(convert_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(convert_error)?;
        Ok(Response::new(status, body))
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        let response = self
            .request(url, body, &stream_headers(headers))
            .send()
            .await
            .map_err(convert_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
            return Err(HttpError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(convert_error)),
        ))
    }
}
