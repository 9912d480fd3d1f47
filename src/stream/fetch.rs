//! POST transport: the response body is read as a byte stream and fed to
//! the [`FrameDecoder`].

use futures_util::StreamExt;
use serde_json::Value;
use tracing::{debug, warn};

use super::handle::CancelSignal;
use super::lifecycle::{CloseReason, Lifecycle};
use crate::auth::StreamToken;
use crate::error::{StreamError, StreamResult};
use crate::sse::{DecodedFrame, FrameDecoder};
use crate::traits::{ByteStream, Headers, HttpClient};

/// Request headers for a streaming POST.
pub(crate) fn fetch_headers(durable: Option<&str>) -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Accept".to_string(), "text/event-stream".to_string());
    if let Some(durable) = durable {
        headers.insert("Authorization".to_string(), format!("Bearer {}", durable));
    }
    headers
}

/// Insert the stream token into the payload under `field`.
///
/// Only JSON objects can carry the token; anything else is sent unchanged.
pub(crate) fn inject_token(mut payload: Value, token: Option<StreamToken>, field: &str) -> Value {
    let Some(token) = token else {
        return payload;
    };
    match payload.as_object_mut() {
        Some(object) => {
            object.insert(field.to_string(), Value::String(token.into_value()));
        }
        None => warn!("Payload is not a JSON object, sending it without the stream token"),
    }
    payload
}

/// Issue the streaming POST.
///
/// Any failure before the body starts (connection or non-2xx status) is an
/// initialization error.
pub(crate) async fn open_fetch<H: HttpClient>(
    http: &H,
    url: &str,
    payload: Value,
    durable: Option<&str>,
    token: Option<StreamToken>,
    token_field: &str,
) -> StreamResult<ByteStream> {
    let body = inject_token(payload, token, token_field);
    let body = serde_json::to_string(&body).map_err(|e| StreamError::Config {
        message: format!("payload could not be serialized: {}", e),
    })?;
    let headers = fetch_headers(durable);

    http.post_stream(url, &body, &headers)
        .await
        .map_err(StreamError::from)
}

/// Read the body until it ends, the sentinel arrives, or the handle closes.
///
/// The lifecycle is expected to be open already: a body exists only once
/// the server accepted the request.
pub(crate) async fn run_fetch_loop(
    mut body: ByteStream,
    mut lifecycle: Lifecycle,
    mut cancel: CancelSignal,
) {
    let mut decoder = FrameDecoder::new();

    let reason = loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => break CloseReason::Cancelled,
            chunk = body.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                if let Some(reason) = dispatch(&mut decoder, &bytes, &mut lifecycle, &cancel) {
                    break reason;
                }
            }
            Some(Err(e)) if e.is_cancellation() => {
                debug!(error = %e, "Body read cancelled");
                break CloseReason::Cancelled;
            }
            Some(Err(e)) => {
                lifecycle.report_error(StreamError::Transport {
                    message: e.to_string(),
                });
                break CloseReason::TransportError;
            }
            None => break CloseReason::EndOfStream,
        }
    };

    drop(body);
    debug!(reason = ?reason, "Released response body");
    lifecycle.close(reason);
}

/// Feed one chunk. Returns a close reason when the chunk ends the stream.
///
/// A `close()` issued from a callback stops delivery before the next frame
/// of the same chunk.
fn dispatch(
    decoder: &mut FrameDecoder,
    bytes: &[u8],
    lifecycle: &mut Lifecycle,
    cancel: &CancelSignal,
) -> Option<CloseReason> {
    for frame in decoder.feed(bytes) {
        if cancel.is_cancelled() {
            return Some(CloseReason::Cancelled);
        }
        match frame {
            DecodedFrame::Message(value) => lifecycle.deliver(value),
            DecodedFrame::Invalid(err) => {
                lifecycle.report_error(err);
            }
            DecodedFrame::Done => return Some(CloseReason::Sentinel),
        }
    }
    None
}
