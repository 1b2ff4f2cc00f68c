//! Line Framing
//!
//! Transports hand over chunks with arbitrary boundaries; adapters expect one
//! complete line at a time. `SseLineBuffer` sits in between.

/// Reassembles raw chunks into complete lines.
///
/// Handles:
/// - lines split across chunks
/// - `\r\n` line endings
/// - a final line with no terminating newline (see [`SseLineBuffer::finish`])
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: String,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk and return every line it completed, without terminators.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].find('\n') {
            let end = consumed + offset;
            lines.push(self.buffer[consumed..end].trim_end_matches('\r').to_string());
            consumed = end + 1;
        }
        self.buffer.drain(..consumed);

        lines
    }

    /// Take whatever is left once the transport has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim_end_matches('\r');
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Bytes held waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}
