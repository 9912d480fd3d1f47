//! GET transport over the native event-stream primitive.
//!
//! Without a request body the stream token can only travel in the query
//! string. The durable credential never does.

use futures_util::StreamExt;
use tracing::debug;

use super::handle::CancelSignal;
use super::lifecycle::{CloseReason, Lifecycle};
use crate::auth::StreamToken;
use crate::error::{StreamError, StreamResult};
use crate::sse::{classify_data, DataFrame};
use crate::traits::{EventSourceConnector, Headers, NativeEvent, NativeEventStream};

/// Append `name=value` to `url`, URL-encoding the value.
pub(crate) fn with_query_param(url: &str, name: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}",
        url,
        separator,
        urlencoding::encode(name),
        urlencoding::encode(value)
    )
}

/// Open a native subscription.
///
/// With a token, the token goes in the query string and no Authorization
/// header is sent. Without one, `durable` (if any) goes in the header.
pub(crate) fn open_native<E: EventSourceConnector>(
    event_source: &E,
    url: &str,
    durable: Option<&str>,
    token: Option<StreamToken>,
    token_param: &str,
) -> StreamResult<NativeEventStream> {
    let mut headers = Headers::new();
    headers.insert("Accept".to_string(), "text/event-stream".to_string());

    let url = match token {
        Some(token) => with_query_param(url, token_param, token.value()),
        None => {
            if let Some(durable) = durable {
                headers.insert("Authorization".to_string(), format!("Bearer {}", durable));
            }
            url.to_string()
        }
    };

    event_source
        .open(&url, &headers)
        .map_err(StreamError::from)
}

/// Pump native events into the lifecycle until the stream ends.
pub(crate) async fn run_native_loop(
    mut events: NativeEventStream,
    mut lifecycle: Lifecycle,
    mut cancel: CancelSignal,
) {
    let reason = loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break CloseReason::Cancelled,
            event = events.next() => event,
        };

        match event {
            Some(Ok(NativeEvent::Open)) => lifecycle.open(),
            Some(Ok(NativeEvent::Message(message))) => {
                // A message implies the connection is up even if Open was missed.
                lifecycle.open();
                match classify_data(message.data.trim()) {
                    DataFrame::Done => break CloseReason::Sentinel,
                    DataFrame::Message(value) => lifecycle.deliver(value),
                    DataFrame::Invalid(err) => {
                        lifecycle.report_error(err);
                    }
                }
            }
            Some(Err(e)) if e.is_cancellation() => {
                debug!(error = %e, "Event stream cancelled");
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

    drop(events);
    debug!(reason = ?reason, "Released event stream");
    lifecycle.close(reason);
}
