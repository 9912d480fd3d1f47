//! The caller-facing connection handle.

use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Connection state as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Transport requested, not yet confirmed
    Connecting,
    /// Bytes may arrive
    Open,
    /// Terminal. No further callbacks
    Closed,
}

/// Which transport a handle is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// POST request whose body is read as a byte stream
    Fetch,
    /// Native event-stream subscription (GET)
    EventSource,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Fetch => "fetch",
            TransportKind::EventSource => "event_source",
        }
    }
}

/// Handle to one streaming call.
///
/// The handle does not own the stream: it can only observe the state and
/// ask the read loop to stop. Clones refer to the same stream. Dropping every
/// handle leaves the stream running until it ends on its own.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    transport: TransportKind,
    state: watch::Receiver<ReadyState>,
    cancel: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Unique id of this stream, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Current state as last published by the read loop.
    pub fn ready_state(&self) -> ReadyState {
        *self.state.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.ready_state() == ReadyState::Closed
    }

    /// Ask the read loop to close the stream.
    ///
    /// Safe to call any number of times; `on_close` still fires once. The
    /// state becomes [`ReadyState::Closed`] once the loop has released the
    /// transport; await [`closed`](Self::closed) to observe it.
    pub fn close(&self) {
        self.cancel.send_replace(true);
    }

    /// Wait until the stream is closed, for any reason.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // An error means the loop is gone, which also means closed.
        let _ = state
            .wait_for(|s| *s == ReadyState::Closed)
            .await
            .map(|_| ());
    }
}

/// Loop-side end of the cancellation signal.
pub(crate) struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Whether `close()` has been called, without waiting.
    ///
    /// Checked between frames of one chunk, since a callback may close the
    /// handle mid-chunk.
    pub(crate) fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `close()` was called on any clone of the handle.
    ///
    /// Never resolves if every handle was dropped without closing.
    pub(crate) async fn cancelled(&mut self) {
        let result = self.rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
        if result.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a handle plus the loop-side state publisher and cancel signal.
pub(crate) fn handle_pair(
    id: Uuid,
    transport: TransportKind,
) -> (ConnectionHandle, watch::Sender<ReadyState>, CancelSignal) {
    let (state_tx, state_rx) = watch::channel(ReadyState::Connecting);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = ConnectionHandle {
        id,
        transport,
        state: state_rx,
        cancel: Arc::new(cancel_tx),
    };
    (handle, state_tx, CancelSignal { rx: cancel_rx })
}
