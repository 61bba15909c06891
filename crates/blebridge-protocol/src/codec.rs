//! Line codec for the host side of the serial link.
//!
//! Replies are `\r`-terminated. Some module firmwares follow the terminator
//! with `\r\n`, so line feeds and empty lines are skipped.

use bytes::{Buf, BytesMut};

use crate::constants::{LINE_FEED, TERMINATOR};

/// Maximum reply line length kept before the buffer is considered garbage.
pub const MAX_REPLY_LENGTH: usize = 256;

/// A codec accumulating reply bytes into complete lines.
#[derive(Debug, Default)]
pub struct ReplyCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl ReplyCodec {
    /// Create a new reply codec.
    pub fn new() -> Self {
        ReplyCodec {
            buffer: BytesMut::with_capacity(MAX_REPLY_LENGTH),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete line from the buffer.
    ///
    /// Returns `Some(line)` without its terminator, or `None` if more data is needed.
    pub fn decode_line(&mut self) -> Option<Vec<u8>> {
        // Skip leftovers of a previous line ending and empty lines
        while !self.buffer.is_empty()
            && (self.buffer[0] == LINE_FEED || self.buffer[0] == TERMINATOR)
        {
            self.buffer.advance(1);
        }

        let end = self.buffer.iter().position(|&b| b == TERMINATOR)?;
        let line = self.buffer.split_to(end).to_vec();
        self.buffer.advance(1);
        Some(line)
    }

    /// Take whatever partial data is buffered, leaving the codec empty.
    pub fn take_partial(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}
