//! Result type alias for streaming operations.

use super::stream::StreamError;

/// Type alias for Results using [`StreamError`].
pub type StreamResult<T> = Result<T, StreamError>;
