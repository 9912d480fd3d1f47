//! Chunk-to-frame decoding for the POST/fetch transport.

use tracing::debug;

use super::{classify_data, parse_sse_line};
use crate::sse::events::{DataFrame, DecodedFrame, SseLine};
use crate::sse::utf8::Utf8Decoder;

/// Stateful decoder from raw body chunks to [`DecodedFrame`]s.
///
/// Every `data:` line is dispatched on its own as soon as its newline
/// arrives; blank lines are not used as dispatch boundaries. The output is
/// the same however the byte stream is split into chunks.
///
/// Once the `[DONE]` sentinel is seen the decoder is finished and ignores
/// everything else, including the rest of the chunk that carried it.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Decoder,
    /// Readahead: the trailing, not yet terminated line
    buffer: String,
    last_event_type: Option<String>,
    last_event_id: Option<String>,
    retry_ms: Option<u64>,
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the frames it completes, in receipt order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedFrame> {
        let mut frames = Vec::new();
        if self.finished {
            return frames;
        }

        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);

        // Lines are consumed by advancing `start`; the buffer is compacted
        // once per chunk.
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].find('\n') {
            let end = start + offset;
            let line = self.buffer[start..end].trim_end_matches('\r');
            start = end + 1;

            match parse_sse_line(line) {
                SseLine::Data(payload) => match classify_data(&payload) {
                    DataFrame::Done => {
                        self.finish();
                        frames.push(DecodedFrame::Done);
                        return frames;
                    }
                    frame => frames.push(frame.into()),
                },
                SseLine::Event(name) => self.last_event_type = Some(name),
                SseLine::Id(id) => self.last_event_id = Some(id),
                SseLine::Retry(value) => match value.parse::<u64>() {
                    Ok(ms) => self.retry_ms = Some(ms),
                    Err(_) => debug!(value = %value, "Ignoring non-numeric retry field"),
                },
                SseLine::Empty | SseLine::Comment(_) => {}
            }
        }
        self.buffer.drain(..start);

        frames
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buffer.clear();
    }

    /// Whether the sentinel has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Text held back because its line is not terminated yet.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Last `event:` value seen. Recorded only; never used for routing.
    pub fn last_event_type(&self) -> Option<&str> {
        self.last_event_type.as_deref()
    }

    /// Last `id:` value seen. Recorded only; there is no resumption.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Last valid `retry:` value. Recorded only; there is no reconnection.
    pub fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }
}
