//! The capability contract the transfer engine runs against
//!
//! A backend opens one stream per transfer. Read streams deliver bytes in
//! order and signal end-of-stream; write streams accept the payload and
//! confirm it on finalize.

use std::fmt;
use thiserror::Error;

/// Broad classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// The object or bucket does not exist
    NotFound,
    /// The bucket or key is not acceptable to the backend
    InvalidPath,
    /// Anything else, including transport failures
    Other,
}

/// A failure reported by the storage backend
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct StreamError {
    pub kind: StreamErrorKind,
    /// The backend's status message
    pub message: String,
}

impl StreamError {
    pub fn new(kind: StreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StreamErrorKind::Other, message)
    }
}

impl From<object_store::Error> for StreamError {
    fn from(err: object_store::Error) -> Self {
        let kind = match &err {
            object_store::Error::NotFound { .. } => StreamErrorKind::NotFound,
            object_store::Error::InvalidPath { .. } => StreamErrorKind::InvalidPath,
            _ => StreamErrorKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<object_store::path::Error> for StreamError {
    fn from(err: object_store::path::Error) -> Self {
        Self::new(StreamErrorKind::InvalidPath, err.to_string())
    }
}

/// Result of one [`ReadStream::read_chunk`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes written to the front of the buffer
    pub filled: usize,
    /// No bytes remain after this read
    pub end_of_stream: bool,
}

/// Confirmation of a committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReceipt {
    pub bucket: String,
    pub key: String,
    /// Bytes committed
    pub size: u64,
    pub e_tag: Option<String>,
    pub version: Option<String>,
}

/// Sequential reader bound to one object
pub trait ReadStream {
    /// Read into `buf`, filling it completely unless the object ends first.
    ///
    /// `filled < buf.len()` is only allowed together with `end_of_stream`.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, StreamError>;

    /// Release the stream
    fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Writer bound to one object
pub trait WriteStream {
    /// Append `data` to the object being written
    fn write_all(&mut self, data: &[u8]) -> Result<(), StreamError>;

    /// Commit the object and return its confirmation
    fn finalize(self: Box<Self>) -> Result<ObjectReceipt, StreamError>;
}

/// A storage client able to open object streams
pub trait StorageBackend: Send + Sync + fmt::Debug {
    fn open_read_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ReadStream + '_>, StreamError>;

    fn open_write_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn WriteStream + '_>, StreamError>;
}
