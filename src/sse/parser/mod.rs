//! SSE line classification and payload parsing.
//!
//! Contains the stateful [`FrameDecoder`] for turning byte chunks into
//! frames, and the stateless functions it is built from.

mod decoder;

pub use decoder::FrameDecoder;

use crate::error::StreamError;
use crate::sse::events::{DataFrame, SseLine, DONE_SENTINEL};

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("id:") {
        return SseLine::Id(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("retry:") {
        return SseLine::Retry(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Interpret one `data:` payload.
///
/// An empty payload is parsed like any other and fails; there is no
/// defaulting to `{}` here.
pub fn classify_data(payload: &str) -> DataFrame {
    if payload == DONE_SENTINEL {
        return DataFrame::Done;
    }

    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => DataFrame::Message(value),
        Err(e) => DataFrame::Invalid(StreamError::InvalidJson {
            payload: payload.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(parse_sse_line(""), SseLine::Empty);
    }

    #[test]
    fn test_parse_comment_line() {
        assert_eq!(
            parse_sse_line(": keepalive"),
            SseLine::Comment("keepalive".to_string())
        );
    }

    #[test]
    fn test_parse_field_lines() {
        assert_eq!(
            parse_sse_line(r#"data: {"token":"H"}"#),
            SseLine::Data(r#"{"token":"H"}"#.to_string())
        );
        assert_eq!(parse_sse_line("data:[DONE]"), SseLine::Data("[DONE]".to_string()));
        assert_eq!(parse_sse_line("event: message"), SseLine::Event("message".to_string()));
        assert_eq!(parse_sse_line("id: 42"), SseLine::Id("42".to_string()));
        assert_eq!(parse_sse_line("retry: 3000"), SseLine::Retry("3000".to_string()));
    }

    #[test]
    fn test_parse_unknown_line_is_comment() {
        assert_eq!(
            parse_sse_line("garbage"),
            SseLine::Comment("garbage".to_string())
        );
    }

    #[test]
    fn test_classify_sentinel() {
        assert_eq!(classify_data("[DONE]"), DataFrame::Done);
    }

    #[test]
    fn test_classify_json() {
        assert_eq!(
            classify_data(r#"{"token":"i"}"#),
            DataFrame::Message(json!({"token": "i"}))
        );
        // Any JSON value is accepted, not only objects.
        assert_eq!(classify_data("42"), DataFrame::Message(json!(42)));
    }

    #[test]
    fn test_classify_empty_payload_is_invalid() {
        match classify_data("") {
            DataFrame::Invalid(StreamError::InvalidJson { payload, .. }) => {
                assert_eq!(payload, "");
            }
            other => panic!("Expected InvalidJson, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_malformed_json() {
        assert!(matches!(
            classify_data("{not json"),
            DataFrame::Invalid(StreamError::InvalidJson { .. })
        ));
    }
}
