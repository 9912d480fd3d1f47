//! Lifecycle controller shared by both transports.
//!
//! The read loop owns a [`Lifecycle`] exclusively, so no locking is needed.
//! Every terminal path (end of body, `[DONE]`, `close()`, fatal transport
//! error) goes through [`Lifecycle::close`], which only acts once.

use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use super::handle::ReadyState;
use crate::error::StreamError;

/// Called for every decoded message, in receipt order.
pub type OnMessage = Box<dyn FnMut(serde_json::Value) + Send + 'static>;

/// Called for per-frame and mid-stream errors.
pub type OnError = Box<dyn FnMut(StreamError) + Send + 'static>;

/// Called once when the stream closes.
pub type OnClose = Box<dyn FnOnce() + Send + 'static>;

/// Why a stream closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The transport reported end of stream
    EndOfStream,
    /// The `[DONE]` sentinel arrived
    Sentinel,
    /// The caller closed the handle
    Cancelled,
    /// The transport failed mid-stream
    TransportError,
}

/// State machine `Connecting -> Open -> Closed` plus the caller's callbacks.
pub struct Lifecycle {
    id: Uuid,
    is_closed: bool,
    state: watch::Sender<ReadyState>,
    on_message: OnMessage,
    on_error: Option<OnError>,
    on_close: Option<OnClose>,
}

impl Lifecycle {
    pub(crate) fn new(
        id: Uuid,
        state: watch::Sender<ReadyState>,
        on_message: OnMessage,
        on_error: Option<OnError>,
        on_close: Option<OnClose>,
    ) -> Self {
        Self {
            id,
            is_closed: false,
            state,
            on_message,
            on_error,
            on_close,
        }
    }

    /// `Connecting -> Open`. No-op when already open or closed.
    pub fn open(&mut self) {
        if self.is_closed {
            return;
        }
        let changed = self.state.send_if_modified(|state| {
            if *state == ReadyState::Connecting {
                *state = ReadyState::Open;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(stream_id = %self.id, "Stream open");
        }
    }

    /// Hand a message to the caller. Dropped once closed.
    pub fn deliver(&mut self, message: serde_json::Value) {
        if self.is_closed {
            return;
        }
        (self.on_message)(message);
    }

    /// Report an error to the caller. Returns false once closed.
    pub fn report_error(&mut self, err: StreamError) -> bool {
        if self.is_closed {
            debug!(stream_id = %self.id, error = %err, "Dropping error reported after close");
            return false;
        }
        warn!(stream_id = %self.id, code = err.error_code(), error = %err, "Stream error");
        if let Some(on_error) = self.on_error.as_mut() {
            on_error(err);
        }
        true
    }

    /// Close the stream. Only the first call has any effect.
    ///
    /// `on_close` runs before `Closed` is published, so anyone awaiting
    /// `ConnectionHandle::closed` observes it already invoked.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if self.is_closed {
            return false;
        }
        self.is_closed = true;
        debug!(stream_id = %self.id, reason = ?reason, "Stream closed");
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
        self.state.send_replace(ReadyState::Closed);
        true
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        // A loop that unwound (e.g. a panicking callback) still ends Closed.
        if !self.is_closed {
            self.state.send_replace(ReadyState::Closed);
        }
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.id)
            .field("is_closed", &self.is_closed)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
