//! Frame reassembly for the newline-delimited stream
//!
//! Each connection owns one assembler. Chunks arrive in read order and in
//! arbitrary sizes; the assembler buffers them and yields one message per
//! line terminator, so the emitted sequence is independent of how the
//! stream was chunked.
//!
//! Known limitation: a peer that never sends a terminator grows the
//! buffer without bound.

use bytes::BytesMut;

const LINE_TERMINATOR: u8 = b'\n';

/// Reassembles a raw byte stream into discrete messages
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: BytesMut,
}

impl LineAssembler {
    pub fn new() -> Self {
        LineAssembler::default()
    }

    /// Append a received chunk to the buffer
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete message, if any
    ///
    /// Returns the line with the terminator removed and surrounding
    /// whitespace trimmed. Blank lines are skipped. Non-UTF-8 bytes are
    /// replaced rather than rejected; the codec will reject garbage.
    pub fn next_message(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|&b| b == LINE_TERMINATOR) {
            let line = self.buf.split_to(pos + 1);
            let message = String::from_utf8_lossy(&line[..pos]);
            let trimmed = message.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        None
    }

    /// Bytes currently held waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}
