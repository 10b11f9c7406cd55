//! Buffer management utilities

use bytes::{Bytes, BytesMut};
use std::collections::TryReserveError;
use std::ops::Deref;

/// An owned object body produced by a read.
///
/// `len()` is the authoritative size. The allocation grows in whole chunks,
/// so `capacity()` is usually larger.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ObjectBuffer {
    data: Vec<u8>,
}

impl ObjectBuffer {
    /// Create an empty, unallocated buffer
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Logical length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Physical allocation in bytes
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the bytes, keeping the oversized allocation
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Make room for `chunk` bytes past the logical length
    pub(crate) fn reserve_chunk(&mut self, chunk: usize) -> Result<(), TryReserveError> {
        self.data.try_reserve_exact(chunk)
    }

    /// Zeroed window of `chunk` bytes past the logical length.
    ///
    /// Must be followed by [`ObjectBuffer::commit`].
    pub(crate) fn chunk_mut(&mut self, chunk: usize) -> &mut [u8] {
        let start = self.data.len();
        self.data.resize(start + chunk, 0);
        &mut self.data[start..]
    }

    /// Keep `advance` bytes of the window opened by [`ObjectBuffer::chunk_mut`]
    pub(crate) fn commit(&mut self, start: usize, advance: usize) {
        self.data.truncate(start + advance);
    }
}

impl Deref for ObjectBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for ObjectBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<ObjectBuffer> for Vec<u8> {
    fn from(buffer: ObjectBuffer) -> Self {
        buffer.data
    }
}

/// A write buffer that accumulates data before uploading
#[derive(Debug, Default)]
pub(crate) struct WriteBuffer {
    buffer: BytesMut,
}

impl WriteBuffer {
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn write(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the buffer contents, leaving it empty
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }
}
