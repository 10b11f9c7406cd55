//! The client facade
//!
//! [`Client`] bundles a [`Connection`], a [`TransferEngine`] and the
//! [`ErrorState`]. Each public operation clears its module's error slot
//! first and records its failure, if any, before returning it.

use crate::backend::{ObjectReceipt, StorageBackend};
use crate::buffer::ObjectBuffer;
use crate::config::Config;
use crate::connection::Connection;
use crate::diagnostics::ErrorState;
use crate::error::Module;
use crate::transfer::TransferEngine;
use crate::{local, Result};
use std::path::Path;
use std::sync::Arc;

/// A storage client with per-module error reporting
#[derive(Debug)]
pub struct Client {
    config: Config,
    connection: Connection,
    engine: TransferEngine,
    errors: ErrorState,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Client {
    /// A client that is not yet connected
    pub fn new(config: Config) -> Self {
        let engine = TransferEngine::from_config(&config.transfer);
        Self {
            config,
            connection: Connection::new(),
            engine,
            errors: ErrorState::new(),
        }
    }

    /// A client already connected to `backend`
    pub fn with_backend(config: Config, backend: Arc<dyn StorageBackend>) -> Self {
        let mut client = Self::new(config);
        client.connection.attach(backend);
        client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    /// Error slots as left by the most recent operations
    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    /// Open the storage connection using ambient credentials
    pub fn open(&mut self) -> Result<()> {
        let storage = &self.config.storage;
        let connection = &mut self.connection;
        self.errors
            .track(Module::Connection, || connection.open(storage))
    }

    /// Read `bucket/key` fully into memory
    pub fn read_object(&mut self, bucket: &str, key: &str) -> Result<ObjectBuffer> {
        let connection = &self.connection;
        let engine = &self.engine;
        self.errors.track(Module::Transfer, || {
            let backend = connection.handle()?;
            engine.read_object(backend.as_ref(), bucket, key)
        })
    }

    /// Write `data` as the content of `bucket/key`
    pub fn write_object(&mut self, bucket: &str, key: &str, data: &[u8]) -> Result<ObjectReceipt> {
        let connection = &self.connection;
        let engine = &self.engine;
        self.errors.track(Module::Transfer, || {
            let backend = connection.handle()?;
            engine.write_object(backend.as_ref(), bucket, key, data)
        })
    }

    /// Load a local file, recording failures in the general slot
    pub fn load_file(&mut self, path: &Path) -> Result<Vec<u8>> {
        self.errors.track(Module::General, || local::load_file(path))
    }

    /// Save a local file, recording failures in the general slot
    pub fn save_file(&mut self, path: &Path, data: &[u8]) -> Result<()> {
        self.errors
            .track(Module::General, || local::save_file(path, data))
    }
}
