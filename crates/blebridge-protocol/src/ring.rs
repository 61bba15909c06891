//! Circular command buffer.
//!
//! The module accumulates serial bytes here until the end-of-command byte
//! arrives. Indices wrap modulo the capacity and one slot is always kept free,
//! so `read == write` means empty and the buffer never holds more than
//! `capacity - 1` unread bytes.
//!
//! ```text
//!            read              write
//!             v                 v
//! +---+---+---+---+---+---+---+---+
//! |   |   | S | E | N | D |   |   |
//! +---+---+---+---+---+---+---+---+
//! ```

use crate::constants::COMMAND_BUFFER_CAPACITY;
use crate::error::{ProtocolError, ProtocolResult};

/// Fixed-capacity ring of pending command bytes.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    buf: Box<[u8]>,
    read_index: usize,
    write_index: usize,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuffer {
    /// Create a buffer with the firmware's default capacity.
    pub fn new() -> Self {
        Self::with_capacity(COMMAND_BUFFER_CAPACITY)
    }

    /// Create a buffer with the given capacity (minimum 2).
    pub fn with_capacity(capacity: usize) -> Self {
        CommandBuffer {
            buf: vec![0u8; capacity.max(2)].into_boxed_slice(),
            read_index: 0,
            write_index: 0,
        }
    }

    /// Total slots, including the one that is never filled.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Current read position.
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Current write position.
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Number of unread bytes.
    pub fn pending_len(&self) -> usize {
        (self.write_index + self.capacity() - self.read_index) % self.capacity()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.read_index == self.write_index
    }

    /// True when another push would be rejected.
    pub fn is_full(&self) -> bool {
        self.pending_len() == self.capacity() - 1
    }

    /// Append one byte.
    ///
    /// When full the byte is rejected and the pending bytes are left intact.
    pub fn try_push(&mut self, byte: u8) -> ProtocolResult<()> {
        if self.is_full() {
            return Err(ProtocolError::BufferFull {
                capacity: self.capacity(),
            });
        }
        self.buf[self.write_index] = byte;
        self.write_index = self.wrap(self.write_index + 1);
        Ok(())
    }

    /// Read the unread byte `offset` positions past the read index.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        if offset >= self.pending_len() {
            return None;
        }
        Some(self.buf[self.wrap(self.read_index + offset)])
    }

    /// Compare the next `literal.len()` unread bytes against `literal`
    /// without consuming them.
    pub fn peek_matches(&self, literal: &[u8]) -> bool {
        if literal.len() > self.pending_len() {
            return false;
        }
        literal
            .iter()
            .enumerate()
            .all(|(i, &b)| self.buf[self.wrap(self.read_index + i)] == b)
    }

    /// Discard `n` unread bytes (clamped to what is pending).
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.pending_len());
        self.read_index = self.wrap(self.read_index + n);
    }

    /// Copy out all unread bytes without consuming them.
    pub fn copy_pending(&self) -> Vec<u8> {
        self.copy_range(0, self.pending_len())
    }

    /// Copy `len` unread bytes starting `offset` past the read index.
    pub fn copy_range(&self, offset: usize, len: usize) -> Vec<u8> {
        let available = self.pending_len().saturating_sub(offset);
        let len = len.min(available);
        (0..len)
            .map(|i| self.buf[self.wrap(self.read_index + offset + i)])
            .collect()
    }

    /// Consume and return all unread bytes.
    pub fn drain(&mut self) -> Vec<u8> {
        let data = self.copy_pending();
        self.discard_all();
        data
    }

    /// Drop everything that is pending (`read := write`).
    pub fn discard_all(&mut self) {
        self.read_index = self.write_index;
    }

    fn wrap(&self, index: usize) -> usize {
        index % self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(buf: &mut CommandBuffer, data: &[u8]) {
        for &b in data {
            buf.try_push(b).unwrap();
        }
    }

    #[test]
    fn test_push_and_pending_len() {
        let mut buf = CommandBuffer::with_capacity(8);
        assert!(buf.is_empty());
        push_all(&mut buf, b"GET");
        assert_eq!(buf.pending_len(), 3);
        assert_eq!(buf.peek_at(0), Some(b'G'));
        assert_eq!(buf.peek_at(3), None);
    }

    #[test]
    fn test_full_rejects_and_keeps_old_bytes() {
        let mut buf = CommandBuffer::with_capacity(4);
        push_all(&mut buf, b"abc");
        assert!(buf.is_full());

        let err = buf.try_push(b'd').unwrap_err();
        assert_eq!(err, ProtocolError::BufferFull { capacity: 4 });
        assert_eq!(buf.copy_pending(), b"abc");
    }

    #[test]
    fn test_wraparound() {
        let mut buf = CommandBuffer::with_capacity(6);
        push_all(&mut buf, b"xxxx");
        buf.consume(4);
        assert!(buf.is_empty());

        // Write index wraps past the end of storage
        push_all(&mut buf, b"SEND");
        assert!(buf.write_index() < buf.read_index());
        assert_eq!(buf.pending_len(), 4);
        assert!(buf.peek_matches(b"SEND"));
        assert!(!buf.peek_matches(b"SEND "));
        assert_eq!(buf.copy_pending(), b"SEND");
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut buf = CommandBuffer::new();
        push_all(&mut buf, b"VERSION");
        assert!(buf.peek_matches(b"VER"));
        assert_eq!(buf.pending_len(), 7);
        buf.consume(3);
        assert!(buf.peek_matches(b"SION"));
    }

    #[test]
    fn test_copy_range() {
        let mut buf = CommandBuffer::new();
        push_all(&mut buf, b"NAME=abc");
        assert_eq!(buf.copy_range(0, 4), b"NAME");
        assert_eq!(buf.copy_range(5, 10), b"abc");
    }

    #[test]
    fn test_discard_all_and_drain() {
        let mut buf = CommandBuffer::with_capacity(16);
        push_all(&mut buf, b"garbage");
        assert_eq!(buf.drain(), b"garbage");
        assert_eq!(buf.read_index(), buf.write_index());

        push_all(&mut buf, b"more");
        buf.discard_all();
        assert!(buf.is_empty());
        assert_eq!(buf.drain(), Vec::<u8>::new());
    }

    #[test]
    fn test_consume_clamps() {
        let mut buf = CommandBuffer::with_capacity(8);
        push_all(&mut buf, b"ab");
        buf.consume(10);
        assert!(buf.is_empty());
    }
}
