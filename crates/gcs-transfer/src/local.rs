//! Whole-file load and save for local payloads

use crate::{Result, TransferError};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a local file fully into memory
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    debug!("Loading local file {}", path.display());
    fs::read(path).map_err(|source| TransferError::LocalIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Create or replace a local file with `data`
pub fn save_file(path: &Path, data: &[u8]) -> Result<()> {
    debug!("Saving {} bytes to local file {}", data.len(), path.display());
    fs::write(path, data).map_err(|source| TransferError::LocalIo {
        path: path.to_path_buf(),
        source,
    })
}
