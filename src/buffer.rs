//! A buffer for reading data from the network.
//!
//! The `ReadBuffer` is a FIFO byte buffer. It is filled by reading from a
//! stream supporting `Read` and exposes the accumulated bytes as a slice.
//! Bytes stay in the buffer until the caller confirms a complete parse and
//! consumes them, so a partial frame or request survives across reads.

use bytes::{Buf, BytesMut};
use std::io::{Read, Result as IoResult};

/// A FIFO buffer for reading packets from the network.
#[derive(Debug)]
pub struct ReadBuffer<const CHUNK_SIZE: usize> {
    storage: BytesMut,
    chunk: Box<[u8; CHUNK_SIZE]>,
}

impl<const CHUNK_SIZE: usize> ReadBuffer<CHUNK_SIZE> {
    /// Initializes an empty input buffer
    pub fn new() -> Self {
        Self::with_capacity(CHUNK_SIZE)
    }

    /// Initializes an empty input buffer with a given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: BytesMut::with_capacity(capacity),
            chunk: Box::new([0; CHUNK_SIZE]),
        }
    }

    /// Reads the next portion of data from the given input stream
    pub fn read_from<S: Read>(&mut self, source: &mut S) -> IoResult<usize> {
        let read_size = source.read(&mut *self.chunk)?;
        self.storage.extend_from_slice(&self.chunk[..read_size]);

        Ok(read_size)
    }

    /// Appends bytes that were read elsewhere, e.g. the tail of a
    /// handshake request that already contained frame data
    pub fn unread(&mut self, data: &[u8]) {
        self.storage.extend_from_slice(data);
    }

    /// Gets the buffered bytes without consuming them
    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    /// Discards the first `count` buffered bytes
    pub fn consume(&mut self, count: usize) {
        self.storage.advance(count);
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the buffer currently holds no bytes
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl<const CHUNK_SIZE: usize> Default for ReadBuffer<CHUNK_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}
