//! # gcs-transfer
//!
//! Whole-object transfers against cloud object storage. A [`Client`] opens
//! one storage connection, reads objects fully into memory and writes
//! in-memory payloads as complete objects.
//!
//! ## Architecture
//!
//! - [`Connection`]: owns the storage client handle built from ambient credentials
//! - [`TransferEngine`]: chunked reads into an [`ObjectBuffer`] and single-shot writes
//! - [`ErrorState`]: last error code and message per [`Module`]
//! - [`LogSink`]: pluggable, level-filtered log delivery, fed from `tracing` by [`SinkLayer`]
//!
//! Transfers go through the [`StorageBackend`] trait. [`ObjectStoreBackend`]
//! implements it on top of `object_store`, using an internal Tokio runtime to
//! drive the async API from blocking callers.

#![warn(missing_debug_implementations)]

mod runtime;

pub mod backend;
pub mod buffer;
pub mod client;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod local;
pub mod log;
pub mod store;
pub mod transfer;

pub use backend::{
    ObjectReceipt, ReadOutcome, ReadStream, StorageBackend, StreamError, StreamErrorKind,
    WriteStream,
};
pub use buffer::ObjectBuffer;
pub use client::Client;
pub use config::{Config, LoggingConfig, Provider, StorageConfig, TransferConfig};
pub use connection::Connection;
pub use diagnostics::{ErrorSlot, ErrorState, ERROR_NOT_FOUND};
pub use error::{Module, Result, TransferError};
pub use log::{FilterMode, LogSink, SinkLayer};
pub use store::ObjectStoreBackend;
pub use transfer::TransferEngine;
