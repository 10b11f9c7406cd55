//! A scripted in-memory storage backend
//!
//! Objects live in a map keyed by `(bucket, key)`. Failures are injected per
//! backend and apply to every stream it opens afterwards.

use gcs_transfer::{
    ObjectReceipt, ReadOutcome, ReadStream, StorageBackend, StreamError, StreamErrorKind,
    WriteStream,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Objects = HashMap<(String, String), Vec<u8>>;

#[derive(Debug, Default, Clone)]
struct Script {
    fail_open_read: Option<String>,
    fail_after_bytes: Option<usize>,
    short_reads: bool,
    fail_close: Option<String>,
    fail_open_write: Option<String>,
    fail_commit: Option<String>,
}

/// Storage backend with injectable failures
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    objects: Arc<Mutex<Objects>>,
    script: Mutex<Script>,
    reads_opened: AtomicUsize,
    reads_closed: Arc<AtomicUsize>,
    commits: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object
    pub fn with_object(self, bucket: &str, key: &str, data: &[u8]) -> Self {
        self.insert(bucket, key, data);
        self
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects()
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    /// Current content of an object
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Opening read streams fails with `message`
    pub fn fail_open_read(self, message: &str) -> Self {
        self.script().fail_open_read = Some(message.to_string());
        self
    }

    /// Read streams fail once a read would go past `bytes`
    pub fn fail_after_bytes(self, bytes: usize) -> Self {
        self.script().fail_after_bytes = Some(bytes);
        self
    }

    /// Read streams deliver one byte per call without signalling end-of-stream
    pub fn short_reads(self) -> Self {
        self.script().short_reads = true;
        self
    }

    /// Closing read streams fails with `message`; the close is still counted
    pub fn fail_close(self, message: &str) -> Self {
        self.script().fail_close = Some(message.to_string());
        self
    }

    /// Opening write streams fails with `message`
    pub fn fail_open_write(self, message: &str) -> Self {
        self.script().fail_open_write = Some(message.to_string());
        self
    }

    /// Finalizing write streams fails with `message`; nothing is stored
    pub fn fail_commit(self, message: &str) -> Self {
        self.script().fail_commit = Some(message.to_string());
        self
    }

    /// Number of read streams opened so far
    pub fn reads_opened(&self) -> usize {
        self.reads_opened.load(Ordering::SeqCst)
    }

    /// Number of read streams closed so far
    pub fn reads_closed(&self) -> usize {
        self.reads_closed.load(Ordering::SeqCst)
    }

    /// Number of successful commits so far
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn objects(&self) -> MutexGuard<'_, Objects> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageBackend for ScriptedBackend {
    fn open_read_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ReadStream + '_>, StreamError> {
        let script = self.script().clone();
        if let Some(message) = script.fail_open_read {
            return Err(StreamError::other(message));
        }

        let data = self.object(bucket, key).ok_or_else(|| {
            StreamError::new(
                StreamErrorKind::NotFound,
                format!("no object '{}' in bucket '{}'", key, bucket),
            )
        })?;

        self.reads_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedReader {
            data,
            position: 0,
            fail_after: script.fail_after_bytes,
            short_reads: script.short_reads,
            fail_close: script.fail_close,
            closed: Arc::clone(&self.reads_closed),
        }))
    }

    fn open_write_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn WriteStream + '_>, StreamError> {
        let script = self.script().clone();
        if let Some(message) = script.fail_open_write {
            return Err(StreamError::other(message));
        }

        Ok(Box::new(ScriptedWriter {
            backend: self,
            bucket: bucket.to_string(),
            key: key.to_string(),
            data: Vec::new(),
            fail_commit: script.fail_commit,
        }))
    }
}

struct ScriptedReader {
    data: Vec<u8>,
    position: usize,
    fail_after: Option<usize>,
    short_reads: bool,
    fail_close: Option<String>,
    closed: Arc<AtomicUsize>,
}

impl ReadStream for ScriptedReader {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, StreamError> {
        let remaining = self.data.len() - self.position;
        let mut count = buf.len().min(remaining);
        if self.short_reads {
            count = count.min(1);
        }

        if let Some(limit) = self.fail_after {
            if self.position + count > limit {
                return Err(StreamError::other(format!(
                    "connection reset after {} bytes",
                    self.position
                )));
            }
        }

        buf[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;

        Ok(ReadOutcome {
            filled: count,
            end_of_stream: self.position == self.data.len(),
        })
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        match &self.fail_close {
            Some(message) => Err(StreamError::other(message.clone())),
            None => Ok(()),
        }
    }
}

struct ScriptedWriter<'a> {
    backend: &'a ScriptedBackend,
    bucket: String,
    key: String,
    data: Vec<u8>,
    fail_commit: Option<String>,
}

impl WriteStream for ScriptedWriter<'_> {
    fn write_all(&mut self, data: &[u8]) -> Result<(), StreamError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<ObjectReceipt, StreamError> {
        let writer = *self;
        if let Some(message) = writer.fail_commit {
            return Err(StreamError::other(message));
        }

        let generation = writer.backend.commits.fetch_add(1, Ordering::SeqCst) + 1;
        let size = writer.data.len() as u64;
        writer.backend.insert(&writer.bucket, &writer.key, &writer.data);

        Ok(ObjectReceipt {
            bucket: writer.bucket,
            key: writer.key,
            size,
            e_tag: Some(format!("\"{}\"", generation)),
            version: Some(generation.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fills_whole_buffer() {
        let backend = ScriptedBackend::new().with_object("b", "k", b"abcdef");
        let mut stream = backend.open_read_stream("b", "k").unwrap();

        let mut buf = [0u8; 4];
        let first = stream.read_chunk(&mut buf).unwrap();
        assert_eq!(first, ReadOutcome { filled: 4, end_of_stream: false });

        let second = stream.read_chunk(&mut buf).unwrap();
        assert_eq!(second, ReadOutcome { filled: 2, end_of_stream: true });
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_commit_stores_object() {
        let backend = ScriptedBackend::new();
        let mut writer = backend.open_write_stream("b", "k").unwrap();
        writer.write_all(b"data").unwrap();
        let receipt = writer.finalize().unwrap();

        assert_eq!(receipt.size, 4);
        assert_eq!(backend.object("b", "k").unwrap(), b"data");
        assert_eq!(backend.commits(), 1);
    }

    #[test]
    fn test_failed_commit_stores_nothing() {
        let backend = ScriptedBackend::new().fail_commit("quota exceeded");
        let mut writer = backend.open_write_stream("b", "k").unwrap();
        writer.write_all(b"data").unwrap();

        assert!(writer.finalize().is_err());
        assert!(backend.object("b", "k").is_none());
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let backend = ScriptedBackend::new();
        let err = backend.open_read_stream("b", "k").err().unwrap();
        assert_eq!(err.kind, StreamErrorKind::NotFound);
    }
}
