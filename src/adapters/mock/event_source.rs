//! Mock native event source for testing.
//!
//! Either replays a scripted list of events or hands the test a live sender.

use futures::channel::mpsc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{
    EventSourceConnector, Headers, HttpError, NativeEvent, NativeEventStream, NativeMessage,
};

/// Sender half of a live mock event source.
pub type NativeEventSender = mpsc::UnboundedSender<Result<NativeEvent, HttpError>>;

/// A recorded `open` call.
#[derive(Debug, Clone)]
pub struct RecordedOpen {
    /// Full URL including query string
    pub url: String,
    /// Headers passed to the primitive
    pub headers: Headers,
}

/// Mock [`EventSourceConnector`].
///
/// Scripts and channels are matched on the URL without its query string, so
/// tests do not need to know the stream token.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    scripts: Arc<Mutex<HashMap<String, Vec<Result<NativeEvent, HttpError>>>>>,
    channels: Arc<Mutex<HashMap<String, mpsc::UnboundedReceiver<Result<NativeEvent, HttpError>>>>>,
    open_error: Arc<Mutex<Option<HttpError>>>,
    opens: Arc<Mutex<Vec<RecordedOpen>>>,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay `events` for the next subscriptions to `url`.
    pub fn set_events(&self, url: &str, events: Vec<Result<NativeEvent, HttpError>>) {
        self.scripts.lock().unwrap().insert(url.to_string(), events);
    }

    /// Replay `Open` followed by one message per data string.
    pub fn set_messages<I, S>(&self, url: &str, data: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut events = vec![Ok(NativeEvent::Open)];
        events.extend(
            data.into_iter()
                .map(|d| Ok(NativeEvent::Message(NativeMessage::data(d)))),
        );
        self.set_events(url, events);
    }

    /// Register a live stream for `url` and return its sender.
    pub fn channel(&self, url: &str) -> NativeEventSender {
        let (tx, rx) = mpsc::unbounded();
        self.channels.lock().unwrap().insert(url.to_string(), rx);
        tx
    }

    /// Make every `open` call fail with `err`.
    pub fn fail_open(&self, err: HttpError) {
        *self.open_error.lock().unwrap() = Some(err);
    }

    /// All recorded `open` calls.
    pub fn opens(&self) -> Vec<RecordedOpen> {
        self.opens.lock().unwrap().clone()
    }
}

impl EventSourceConnector for MockEventSource {
    fn open(&self, url: &str, headers: &Headers) -> Result<NativeEventStream, HttpError> {
        self.opens.lock().unwrap().push(RecordedOpen {
            url: url.to_string(),
            headers: headers.clone(),
        });

        if let Some(err) = self.open_error.lock().unwrap().clone() {
            return Err(err);
        }

        let key = url.split('?').next().unwrap_or(url);

        if let Some(rx) = self.channels.lock().unwrap().remove(key) {
            return Ok(Box::pin(rx));
        }

        match self.scripts.lock().unwrap().get(key) {
            Some(events) => Ok(Box::pin(futures::stream::iter(events.clone()))),
            None => Err(HttpError::Other(format!("No mock event source for URL: {}", key))),
        }
    }
}
