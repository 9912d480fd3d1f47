//! Native event-stream trait abstraction.
//!
//! Subscribe-only streams (no request body) use a built-in event-stream
//! primitive instead of a hand-read POST body. The primitive parses the wire
//! format itself and hands over whole messages.

use futures::Stream;
use std::pin::Pin;

use super::http::{Headers, HttpError};

/// One message delivered by the native primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMessage {
    /// Value of the `event:` field (`"message"` when absent)
    pub event_type: String,
    /// The `data:` payload
    pub data: String,
    /// Value of the `id:` field, if any
    pub id: Option<String>,
}

impl NativeMessage {
    /// Build a plain `message` event with the given data.
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            event_type: "message".to_string(),
            data: data.into(),
            id: None,
        }
    }
}

/// Events surfaced by a native event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    /// The connection is established.
    Open,
    /// A complete message arrived.
    Message(NativeMessage),
}

/// Stream of native events. Ends (`None`) when the server closes the stream.
pub type NativeEventStream = Pin<Box<dyn Stream<Item = Result<NativeEvent, HttpError>> + Send>>;

/// Opens native event streams.
///
/// Dropping the returned stream must release the underlying connection.
/// Implementations must not reconnect on their own.
pub trait EventSourceConnector: Send + Sync {
    /// Open a stream to `url`. Connection happens lazily when polled.
    fn open(&self, url: &str, headers: &Headers) -> Result<NativeEventStream, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_message_data_defaults() {
        let msg = NativeMessage::data(r#"{"token":"x"}"#);
        assert_eq!(msg.event_type, "message");
        assert_eq!(msg.data, r#"{"token":"x"}"#);
        assert!(msg.id.is_none());
    }
}
