//! Shared helpers for integration tests.

#![allow(dead_code)]

use chatstream::{ConnectionHandle, StreamError, StreamOptions};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::ResponseTemplate;

/// A 200 response carrying `body` as an event stream.
pub fn event_stream(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/event-stream")
        .set_body_string(body)
}

/// Records every callback a stream makes.
#[derive(Clone, Default)]
pub struct Recorder {
    messages: Arc<Mutex<Vec<Value>>>,
    errors: Arc<Mutex<Vec<StreamError>>>,
    closes: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn on_message(&self) -> impl FnMut(Value) + Send + 'static {
        let messages = self.messages.clone();
        move |v| messages.lock().unwrap().push(v)
    }

    pub fn options(&self) -> StreamOptions {
        let errors = self.errors.clone();
        let closes = self.closes.clone();
        StreamOptions::new()
            .on_error(move |e| errors.lock().unwrap().push(e))
            .on_close(move || {
                closes.fetch_add(1, Ordering::SeqCst);
            })
    }

    pub fn messages(&self) -> Vec<Value> {
        self.messages.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<StreamError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub async fn wait_closed(&self, handle: &ConnectionHandle) {
        tokio::time::timeout(Duration::from_secs(5), handle.closed())
            .await
            .expect("stream did not close in time");
    }
}
