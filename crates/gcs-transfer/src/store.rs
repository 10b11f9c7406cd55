//! `object_store` adapter for the stream capability
//!
//! One [`ObjectStoreBackend`] serves every bucket of a provider. Stores are
//! built per bucket on first use and cached. Async calls run on the shared
//! Tokio runtime and block the caller.

use crate::backend::{
    ObjectReceipt, ReadOutcome, ReadStream, StorageBackend, StreamError, StreamErrorKind,
    WriteStream,
};
use crate::buffer::WriteBuffer;
use crate::config::Provider;
use crate::runtime::shared_runtime;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{DynObjectStore, PutPayload};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path as StdPath, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tracing::{debug, trace};

/// Storage backend over the `object_store` crate
pub struct ObjectStoreBackend {
    provider: Provider,
    runtime: Arc<Runtime>,
    stores: Mutex<HashMap<String, Arc<DynObjectStore>>>,
}

impl ObjectStoreBackend {
    /// Create a backend for `provider` on the shared runtime
    pub fn new(provider: Provider) -> Result<Self, StreamError> {
        let runtime = shared_runtime()
            .map_err(|e| StreamError::other(format!("Failed to create Tokio runtime: {}", e)))?;
        Ok(Self {
            provider,
            runtime,
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// Backend whose buckets live in process memory
    pub fn in_memory() -> Result<Self, StreamError> {
        Self::new(Provider::Memory)
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// The store for `bucket`, building it on first use
    pub fn store_for(&self, bucket: &str) -> Result<Arc<DynObjectStore>, StreamError> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StreamError::other("Store cache lock poisoned"))?;

        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        debug!(bucket, provider = ?self.provider, "Building object store");
        let store = build_store(&self.provider, bucket)?;
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

impl fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

fn build_store(provider: &Provider, bucket: &str) -> Result<Arc<DynObjectStore>, StreamError> {
    match provider {
        #[cfg(feature = "gcp")]
        Provider::Gcs => {
            let store = object_store::gcp::GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "aws")]
        Provider::S3 => {
            let store = object_store::aws::AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "azure")]
        Provider::Azure => {
            let store = object_store::azure::MicrosoftAzureBuilder::from_env()
                .with_container_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        }
        Provider::Local { root } => {
            let dir = local_bucket_dir(root, bucket)?;
            let store = object_store::local::LocalFileSystem::new_with_prefix(dir)?;
            Ok(Arc::new(store))
        }
        Provider::Memory => Ok(Arc::new(object_store::memory::InMemory::new())),
        #[allow(unreachable_patterns)]
        other => Err(StreamError::other(format!(
            "Provider {:?} is not enabled in this build",
            other
        ))),
    }
}

/// Directory of `bucket` under `root`; the bucket must be a single plain path component
fn local_bucket_dir(root: &StdPath, bucket: &str) -> Result<PathBuf, StreamError> {
    let mut components = StdPath::new(bucket).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == OsStr::new(bucket) => Ok(root.join(name)),
        _ => Err(StreamError::new(
            StreamErrorKind::InvalidPath,
            format!("bucket name '{}' is not a single directory name", bucket),
        )),
    }
}

impl StorageBackend for ObjectStoreBackend {
    fn open_read_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ReadStream + '_>, StreamError> {
        let store = self.store_for(bucket)?;
        let path = ObjectPath::parse(key)?;

        trace!(bucket, key, "GET");
        let result = self.runtime.block_on(store.get(&path))?;

        Ok(Box::new(ObjectReadStream {
            runtime: &self.runtime,
            stream: Some(result.into_stream()),
            pending: Bytes::new(),
        }))
    }

    fn open_write_stream(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn WriteStream + '_>, StreamError> {
        let store = self.store_for(bucket)?;
        let path = ObjectPath::parse(key)?;

        Ok(Box::new(ObjectWriteStream {
            runtime: &self.runtime,
            store,
            bucket: bucket.to_string(),
            path,
            buffer: WriteBuffer::default(),
        }))
    }
}

/// Read stream over a GET response body
struct ObjectReadStream<'a> {
    runtime: &'a Runtime,
    /// `None` once the body has been fully consumed or closed
    stream: Option<BoxStream<'static, object_store::Result<Bytes>>>,
    /// Bytes received but not yet handed out
    pending: Bytes,
}

impl ReadStream for ObjectReadStream<'_> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, StreamError> {
        let mut filled = 0;

        while filled < buf.len() {
            if self.pending.is_empty() {
                let Some(stream) = self.stream.as_mut() else {
                    break;
                };
                match self.runtime.block_on(stream.next()) {
                    Some(Ok(bytes)) => self.pending = bytes,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        self.stream = None;
                        break;
                    }
                }
                continue;
            }

            let n = self.pending.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&self.pending[..n]);
            self.pending = self.pending.slice(n..);
            filled += n;
        }

        Ok(ReadOutcome {
            filled,
            end_of_stream: self.stream.is_none() && self.pending.is_empty(),
        })
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.stream = None;
        self.pending = Bytes::new();
        Ok(())
    }
}

/// Write stream that commits the whole object with a single PUT
struct ObjectWriteStream<'a> {
    runtime: &'a Runtime,
    store: Arc<DynObjectStore>,
    bucket: String,
    path: ObjectPath,
    buffer: WriteBuffer,
}

impl WriteStream for ObjectWriteStream<'_> {
    fn write_all(&mut self, data: &[u8]) -> Result<(), StreamError> {
        self.buffer.write(data);
        Ok(())
    }

    fn finalize(mut self: Box<Self>) -> Result<ObjectReceipt, StreamError> {
        let size = self.buffer.len() as u64;
        let data = self.buffer.take();

        debug!("Uploading {} bytes to {}", size, self.path);
        let result = self
            .runtime
            .block_on(self.store.put(&self.path, PutPayload::from(data)))?;

        Ok(ObjectReceipt {
            bucket: self.bucket.clone(),
            key: self.path.to_string(),
            size,
            e_tag: result.e_tag,
            version: result.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let backend = ObjectStoreBackend::in_memory().unwrap();

        let mut writer = backend.open_write_stream("bucket", "dir/file.bin").unwrap();
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        let receipt = writer.finalize().unwrap();
        assert_eq!(receipt.size, 11);
        assert_eq!(receipt.key, "dir/file.bin");

        let mut reader = backend.open_read_stream("bucket", "dir/file.bin").unwrap();
        let mut buf = [0u8; 4];
        let first = reader.read_chunk(&mut buf).unwrap();
        assert_eq!(first, ReadOutcome { filled: 4, end_of_stream: false });
        assert_eq!(&buf, b"hell");

        let mut rest = [0u8; 16];
        let second = reader.read_chunk(&mut rest).unwrap();
        assert_eq!(second, ReadOutcome { filled: 7, end_of_stream: true });
        assert_eq!(&rest[..7], b"o world");
    }

    #[test]
    fn test_exact_fill_reports_eof_on_next_read() {
        let backend = ObjectStoreBackend::in_memory().unwrap();
        let mut writer = backend.open_write_stream("b", "k").unwrap();
        writer.write_all(b"abcd").unwrap();
        writer.finalize().unwrap();

        let mut reader = backend.open_read_stream("b", "k").unwrap();
        let mut buf = [0u8; 4];
        let outcome = reader.read_chunk(&mut buf).unwrap();
        assert_eq!(outcome.filled, 4);

        if !outcome.end_of_stream {
            let outcome = reader.read_chunk(&mut buf).unwrap();
            assert_eq!(outcome, ReadOutcome { filled: 0, end_of_stream: true });
        }
    }

    #[test]
    fn test_buckets_are_isolated() {
        let backend = ObjectStoreBackend::in_memory().unwrap();
        let mut writer = backend.open_write_stream("first", "k").unwrap();
        writer.write_all(b"data").unwrap();
        writer.finalize().unwrap();

        let err = backend.open_read_stream("second", "k").err().unwrap();
        assert_eq!(err.kind, StreamErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let backend = ObjectStoreBackend::in_memory().unwrap();
        let err = backend.open_read_stream("b", "a//b").err().unwrap();
        assert_eq!(err.kind, StreamErrorKind::InvalidPath);
    }

    #[test]
    fn test_local_provider_requires_bucket_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let backend = ObjectStoreBackend::new(Provider::Local {
            root: root.path().to_path_buf(),
        })
        .unwrap();

        assert!(backend.store_for("missing").is_err());

        std::fs::create_dir(root.path().join("present")).unwrap();
        let mut writer = backend.open_write_stream("present", "obj.txt").unwrap();
        writer.write_all(b"on disk").unwrap();
        writer.finalize().unwrap();

        let on_disk = std::fs::read(root.path().join("present").join("obj.txt")).unwrap();
        assert_eq!(on_disk, b"on disk");
    }

    #[test]
    fn test_local_bucket_cannot_leave_root() {
        let outer = tempfile::TempDir::new().unwrap();
        let root = outer.path().join("inside");
        std::fs::create_dir(&root).unwrap();
        let backend = ObjectStoreBackend::new(Provider::Local { root: root.clone() }).unwrap();

        for bucket in ["..", ".", "/etc", "a/b", "inside/../.."] {
            let err = backend.open_write_stream(bucket, "escaped.txt").err().unwrap();
            assert_eq!(err.kind, StreamErrorKind::InvalidPath, "bucket {:?}", bucket);
        }
        assert!(!outer.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_local_bucket_dir_accepts_plain_names() {
        let root = StdPath::new("/srv/buckets");
        assert_eq!(
            local_bucket_dir(root, "archive-2024").unwrap(),
            root.join("archive-2024")
        );
        assert!(local_bucket_dir(root, "").is_err());
        assert!(local_bucket_dir(root, "archive/").is_err());
    }
}
