//! Native event-stream adapter backed by `eventsource-client`.
//!
//! Reconnection is switched off: a dropped subscription surfaces to the
//! caller as an error and the handle closes.

use eventsource_client as es;
use es::Client as _;
use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;

use crate::traits::{
    EventSourceConnector, Headers, HttpError, NativeEvent, NativeEventStream, NativeMessage,
};

/// [`EventSourceConnector`] using the `eventsource-client` crate.
#[derive(Debug, Clone, Default)]
pub struct EsEventSource;

impl EsEventSource {
    pub fn new() -> Self {
        Self
    }
}

/// Server-side end of stream. Not an error from the caller's point of view.
fn is_end_of_stream(err: &es::Error) -> bool {
    matches!(err, es::Error::Eof | es::Error::StreamClosed)
}

struct EsState {
    inner: Pin<Box<dyn Stream<Item = Result<es::SSE, es::Error>> + Send + Sync>>,
    opened: bool,
    pending: Option<NativeEvent>,
    failed: bool,
}

impl EventSourceConnector for EsEventSource {
    fn open(&self, url: &str, headers: &Headers) -> Result<NativeEventStream, HttpError> {
        let mut builder =
            es::ClientBuilder::for_url(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        for (name, value) in headers {
            builder = builder
                .header(name, value)
                .map_err(|e| HttpError::Other(e.to_string()))?;
        }
        let client = builder
            .reconnect(es::ReconnectOptions::reconnect(false).build())
            .build();

        let state = EsState {
            inner: client.stream(),
            opened: false,
            pending: None,
            failed: false,
        };

        // The first item of any kind proves the connection is up, so `Open`
        // is emitted right before it.
        let stream = futures::stream::unfold(state, |mut st| async move {
            loop {
                if let Some(event) = st.pending.take() {
                    return Some((Ok(event), st));
                }
                if st.failed {
                    return None;
                }
                match st.inner.next().await {
                    None => return None,
                    Some(Ok(es::SSE::Event(ev))) => {
                        let message = NativeEvent::Message(NativeMessage {
                            event_type: ev.event_type,
                            data: ev.data,
                            id: ev.id,
                        });
                        if st.opened {
                            return Some((Ok(message), st));
                        }
                        st.opened = true;
                        st.pending = Some(message);
                        return Some((Ok(NativeEvent::Open), st));
                    }
                    Some(Ok(_)) => {
                        if !st.opened {
                            st.opened = true;
                            return Some((Ok(NativeEvent::Open), st));
                        }
                    }
                    Some(Err(e)) if is_end_of_stream(&e) => return None,
                    Some(Err(e)) => {
                        st.failed = true;
                        return Some((Err(HttpError::Io(e.to_string())), st));
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
