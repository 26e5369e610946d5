//! Session buffer with exact byte accounting.
//!
//! The buffer holds, at every observation point, exactly the bytes received
//! from the stream that have not yet been returned to a caller. Consuming a
//! matched prefix and draining on timeout are the only ways bytes leave.

use bytes::BytesMut;

/// Accumulates stream output until a match target consumes a prefix.
#[derive(Debug, Default)]
pub struct SessionBuffer {
    buf: BytesMut,
}

impl SessionBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Append a chunk of stream data, unmodified.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Split off and return the prefix up to `end` (exclusive), leaving the
    /// remainder buffered for the next read.
    pub fn consume_to(&mut self, end: usize) -> Vec<u8> {
        self.buf.split_to(end).to_vec()
    }

    /// Drain the entire buffer, leaving it empty.
    pub fn take_all(&mut self) -> Vec<u8> {
        self.buf.split().to_vec()
    }

    /// View the buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_keeps_bytes_verbatim() {
        let mut buffer = SessionBuffer::new();
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
        assert_eq!(buffer.len(), 13);
    }

    #[test]
    fn test_consume_to_partitions_exactly() {
        let mut buffer = SessionBuffer::new();
        buffer.extend(b"output$ trailing");

        // Prefix through the prompt, remainder stays put
        let prefix = buffer.consume_to(8);
        assert_eq!(prefix, b"output$ ");
        assert_eq!(buffer.as_slice(), b"trailing");

        // Prefix + remainder reassemble the original
        let mut whole = prefix;
        whole.extend_from_slice(buffer.as_slice());
        assert_eq!(whole, b"output$ trailing");
    }

    #[test]
    fn test_consume_full_length_empties_buffer() {
        let mut buffer = SessionBuffer::new();
        buffer.extend(b"abc");
        assert_eq!(buffer.consume_to(3), b"abc");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_all_drains() {
        let mut buffer = SessionBuffer::new();
        buffer.extend(b"partial ");
        buffer.extend(b"output");
        assert_eq!(buffer.take_all(), b"partial output");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_chunks_appended_in_order() {
        let mut buffer = SessionBuffer::new();
        buffer.extend(b"ab");
        buffer.extend(b"cd");
        buffer.extend(b"ef");
        assert_eq!(buffer.as_slice(), b"abcdef");
    }
}
