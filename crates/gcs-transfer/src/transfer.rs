//! Whole-object transfers
//!
//! Reads grow an [`ObjectBuffer`] one chunk at a time until the stream
//! reports end-of-stream. Writes hand the whole payload to the stream in one
//! call and then finalize it.

use crate::backend::{ObjectReceipt, StorageBackend};
use crate::buffer::ObjectBuffer;
use crate::config::{TransferConfig, DEFAULT_CHUNK_SIZE};
use crate::{Result, TransferError};
use tracing::{debug, info, trace, warn};

/// The streaming transfer engine
#[derive(Debug, Clone)]
pub struct TransferEngine {
    chunk_size: usize,
}

impl Default for TransferEngine {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl TransferEngine {
    /// Engine growing read buffers by `chunk_size` bytes (at least 1)
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read the whole of `bucket/key` into a new buffer
    pub fn read_object(
        &self,
        backend: &dyn StorageBackend,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectBuffer> {
        check_identifiers(bucket, key)?;
        info!(bucket, key, "Reading object");

        let mut stream = backend
            .open_read_stream(bucket, key)
            .map_err(|e| TransferError::ReadOpen {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.message,
            })?;

        let chunk = self.chunk_size;
        let mut buffer = ObjectBuffer::new();
        let result = loop {
            let length = buffer.len();

            if buffer.reserve_chunk(chunk).is_err() {
                break Err(TransferError::OutOfMemory {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    requested: length.saturating_add(chunk),
                });
            }

            let outcome = match stream.read_chunk(buffer.chunk_mut(chunk)) {
                Ok(outcome) => outcome,
                Err(e) => {
                    break Err(TransferError::ReadStream {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        transferred: length,
                        message: e.message,
                    })
                }
            };
            trace!(length, filled = outcome.filled, eof = outcome.end_of_stream, "Read chunk");

            if outcome.end_of_stream {
                buffer.commit(length, outcome.filled.min(chunk));
                break Ok(());
            }

            if outcome.filled != chunk {
                buffer.commit(length, 0);
                break Err(TransferError::ReadStream {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    transferred: length,
                    message: format!(
                        "short read of {} bytes without end of stream",
                        outcome.filled
                    ),
                });
            }

            buffer.commit(length, chunk);
        };

        if let Err(e) = stream.close() {
            warn!(bucket, key, "Failed to close read stream: {}", e);
        }

        result?;
        info!(bucket, key, "Finished reading {} bytes", buffer.len());
        Ok(buffer)
    }

    /// Write `data` as the whole content of `bucket/key`
    pub fn write_object(
        &self,
        backend: &dyn StorageBackend,
        bucket: &str,
        key: &str,
        data: &[u8],
    ) -> Result<ObjectReceipt> {
        check_identifiers(bucket, key)?;
        if data.is_empty() {
            return Err(TransferError::InvalidArgument(
                "write payload is empty".to_string(),
            ));
        }

        info!(bucket, key, "Writing {} bytes", data.len());
        let mut stream = backend
            .open_write_stream(bucket, key)
            .map_err(|e| TransferError::WriteOpen {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.message,
            })?;

        let commit_error = |message: String| TransferError::WriteCommit {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        };

        debug!(bucket, key, "Writing payload");
        stream.write_all(data).map_err(|e| commit_error(e.message))?;

        debug!(bucket, key, "Finalizing write");
        let receipt = stream.finalize().map_err(|e| commit_error(e.message))?;

        info!(bucket, key, "Finished writing object");
        Ok(receipt)
    }
}

fn check_identifiers(bucket: &str, key: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(TransferError::InvalidArgument(
            "bucket name is empty".to_string(),
        ));
    }
    if key.is_empty() {
        return Err(TransferError::InvalidArgument("object key is empty".to_string()));
    }
    Ok(())
}
