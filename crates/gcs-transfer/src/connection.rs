//! Connection holder
//!
//! Holds the single storage client handle that transfers run against.
//! Credentials come from the environment of the chosen provider.

use crate::backend::StorageBackend;
use crate::config::StorageConfig;
use crate::store::ObjectStoreBackend;
use crate::{Result, TransferError};
use std::sync::Arc;
use tracing::{debug, info};

/// Owner of the storage client handle
#[derive(Debug, Default)]
pub struct Connection {
    handle: Option<Arc<dyn StorageBackend>>,
}

impl Connection {
    /// A holder with no handle; transfers fail with `NotConnected` until opened
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for the configured provider and make it current.
    ///
    /// When a default bucket is configured its store is built immediately so
    /// credential problems are reported here. Any previous handle is dropped
    /// first, so after a failed open transfers fail with `NotConnected`.
    pub fn open(&mut self, storage: &StorageConfig) -> Result<()> {
        info!(provider = ?storage.provider, "Opening storage connection");
        self.handle = None;

        let backend = ObjectStoreBackend::new(storage.provider.clone()).map_err(|e| {
            TransferError::Connection {
                message: e.message,
            }
        })?;

        if let Some(bucket) = &storage.default_bucket {
            debug!(bucket = bucket.as_str(), "Resolving default bucket");
            backend
                .store_for(bucket)
                .map_err(|e| TransferError::Connection {
                    message: format!("bucket '{}': {}", bucket, e.message),
                })?;
        }

        self.handle = Some(Arc::new(backend));
        info!("Storage connection open");
        Ok(())
    }

    /// Make an already-built backend current
    pub fn attach(&mut self, backend: Arc<dyn StorageBackend>) {
        self.handle = Some(backend);
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// A shared reference to the current handle
    pub fn handle(&self) -> Result<Arc<dyn StorageBackend>> {
        self.handle.clone().ok_or(TransferError::NotConnected)
    }
}
