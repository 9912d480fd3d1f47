//! SSE line and frame types.

use crate::error::StreamError;

/// In-band payload that ends a stream gracefully.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Represents a classified SSE line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// Data payload (e.g., "data: {\"token\": \"H\"}")
    Data(String),
    /// Event type declaration (e.g., "event: message")
    Event(String),
    /// Event id (e.g., "id: 42")
    Id(String),
    /// Reconnection delay in milliseconds, still unparsed
    Retry(String),
    /// Empty line - the wire format's event terminator
    Empty,
    /// Comment line (starts with ':') or an unrecognized line
    Comment(String),
}

/// What a single `data:` payload means.
#[derive(Debug, Clone, PartialEq)]
pub enum DataFrame {
    /// The `[DONE]` sentinel
    Done,
    /// A parsed JSON message
    Message(serde_json::Value),
    /// The payload was not valid JSON
    Invalid(StreamError),
}

/// Output of [`FrameDecoder::feed`](super::FrameDecoder::feed), in receipt order.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    /// Dispatch this message to the caller
    Message(serde_json::Value),
    /// Report this per-frame error; the stream continues
    Invalid(StreamError),
    /// The sentinel arrived; nothing after it is processed
    Done,
}

impl From<DataFrame> for DecodedFrame {
    fn from(frame: DataFrame) -> Self {
        match frame {
            DataFrame::Done => DecodedFrame::Done,
            DataFrame::Message(value) => DecodedFrame::Message(value),
            DataFrame::Invalid(err) => DecodedFrame::Invalid(err),
        }
    }
}
