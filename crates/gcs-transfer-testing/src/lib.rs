//! Testing utilities for gcs-transfer
//!
//! Provides a scripted in-memory [`StorageBackend`](gcs_transfer::StorageBackend),
//! a log recorder, payload fixtures and temporary directories.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod backend;
pub mod fixtures;
pub mod logging;

pub use backend::ScriptedBackend;
pub use logging::LogRecorder;

/// Creates a temporary test directory with cleanup on drop
#[derive(Debug)]
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary test directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a file with the given name and content in the test directory
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Creates a directory with the given name in the test directory
    pub fn create_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Writes a config file selecting the local provider rooted at `root`
    pub fn write_local_config(&self, root: &Path, chunk_size: usize) -> Result<PathBuf> {
        let content = format!(
            "[storage.provider]\nkind = \"local\"\nroot = '{}'\n\n[transfer]\nchunk_size = {}\n",
            root.display(),
            chunk_size
        );
        self.create_file("config.toml", content.as_bytes())
    }
}
