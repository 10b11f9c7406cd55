//! Error types for gcs-transfer

use std::path::PathBuf;
use thiserror::Error;

/// The logical module an error is recorded against.
///
/// Each module owns one error slot in [`crate::ErrorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Opening the storage connection
    Connection,
    /// Object reads and writes
    Transfer,
    /// Everything else: configuration and local file I/O
    General,
}

impl Module {
    /// All modules, in reporting order
    pub const ALL: [Module; 3] = [Module::Connection, Module::Transfer, Module::General];

    /// Label used when formatting error lines
    pub fn label(self) -> &'static str {
        match self {
            Module::Connection => "Connection",
            Module::Transfer => "Transfer",
            Module::General => "General",
        }
    }
}

/// Errors produced by connection, transfer and support operations
#[derive(Error, Debug)]
pub enum TransferError {
    /// The storage client could not be constructed
    #[error("Failed to open storage connection: {message}")]
    Connection { message: String },

    /// A transfer was attempted before the connection was opened
    #[error("Storage connection is not open")]
    NotConnected,

    /// Empty identifiers or an empty write payload
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The object could not be opened for reading
    #[error("Failed to read '{key}' from '{bucket}' with status '{message}'")]
    ReadOpen {
        bucket: String,
        key: String,
        message: String,
    },

    /// The read stream failed part way through the object
    #[error("Failed to read '{key}' from '{bucket}': read failed after {transferred} bytes ({message})")]
    ReadStream {
        bucket: String,
        key: String,
        transferred: usize,
        message: String,
    },

    /// The object could not be opened for writing
    #[error("Failed to write '{key}' to '{bucket}' with status '{message}'")]
    WriteOpen {
        bucket: String,
        key: String,
        message: String,
    },

    /// Finalizing the write did not produce a confirmation
    #[error("Failed to commit '{key}' to '{bucket}' with status '{message}'")]
    WriteCommit {
        bucket: String,
        key: String,
        message: String,
    },

    /// Growing the read buffer failed
    #[error("Failed to read '{key}' from '{bucket}': memory allocation error with size {requested}")]
    OutOfMemory {
        bucket: String,
        key: String,
        requested: usize,
    },

    /// Local file load or save failed
    #[error("Local file '{}' failed: {}", .path.display(), .source)]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransferError {
    /// Stable numeric code reported alongside the message
    pub fn code(&self) -> i32 {
        match self {
            TransferError::Connection { .. } => 1,
            TransferError::NotConnected => 2,
            TransferError::InvalidArgument(_) => 3,
            TransferError::ReadOpen { .. } => 9,
            TransferError::OutOfMemory { .. } => 10,
            TransferError::WriteOpen { .. } => 11,
            TransferError::ReadStream { .. } => 12,
            TransferError::WriteCommit { .. } => 13,
            TransferError::LocalIo { .. } => 20,
            TransferError::Config(_) => 21,
        }
    }

    /// The module whose slot records this error
    pub fn module(&self) -> Module {
        match self {
            TransferError::Connection { .. } => Module::Connection,
            TransferError::LocalIo { .. } | TransferError::Config(_) => Module::General,
            _ => Module::Transfer,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_non_zero_and_distinct() {
        let errors = [
            TransferError::Connection { message: "x".into() },
            TransferError::NotConnected,
            TransferError::InvalidArgument("x".into()),
            TransferError::ReadOpen { bucket: "b".into(), key: "k".into(), message: "m".into() },
            TransferError::OutOfMemory { bucket: "b".into(), key: "k".into(), requested: 1 },
            TransferError::WriteOpen { bucket: "b".into(), key: "k".into(), message: "m".into() },
            TransferError::ReadStream {
                bucket: "b".into(),
                key: "k".into(),
                transferred: 0,
                message: "m".into(),
            },
            TransferError::WriteCommit { bucket: "b".into(), key: "k".into(), message: "m".into() },
            TransferError::Config("x".into()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_module_routing() {
        assert_eq!(
            TransferError::Connection { message: "x".into() }.module(),
            Module::Connection
        );
        assert_eq!(TransferError::NotConnected.module(), Module::Transfer);
        assert_eq!(TransferError::Config("x".into()).module(), Module::General);
    }

    #[test]
    fn test_read_open_message_names_object() {
        let err = TransferError::ReadOpen {
            bucket: "photos".into(),
            key: "cat.jpg".into(),
            message: "No such object".into(),
        };
        let text = err.to_string();
        assert!(text.contains("photos"));
        assert!(text.contains("cat.jpg"));
        assert!(text.contains("No such object"));
    }
}
