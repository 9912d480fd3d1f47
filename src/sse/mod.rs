//! SSE (Server-Sent Events) frame decoding
//!
//! The backend streams text lines of the form:
//! - `data: <json | [DONE]>` - payload line, dispatched immediately
//! - `event: <name>`, `id: <value>`, `retry: <ms>` - recorded, not acted on
//! - Empty line - event terminator (not required for dispatch)
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `events` - Line and frame types (SseLine, DataFrame, DecodedFrame)
//! - `utf8` - Streaming UTF-8 decoder
//! - `parser` - Line classification and the stateful FrameDecoder

mod events;
mod parser;
mod utf8;

// Re-export public types
pub use events::{DataFrame, DecodedFrame, SseLine, DONE_SENTINEL};
pub use parser::{classify_data, parse_sse_line, FrameDecoder};
pub use utf8::Utf8Decoder;
