//! Client behavior against a scripted backend

use gcs_transfer::{Client, Config, Module, TransferConfig, TransferError, ERROR_NOT_FOUND};
use gcs_transfer_testing::fixtures::{boundary_sizes, patterned};
use gcs_transfer_testing::ScriptedBackend;
use std::sync::Arc;

const CHUNK: usize = 32;

fn client_with(backend: Arc<ScriptedBackend>) -> Client {
    let config = Config {
        transfer: TransferConfig { chunk_size: CHUNK },
        ..Config::default()
    };
    Client::with_backend(config, backend)
}

#[test]
fn test_reads_across_chunk_boundaries() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut client = client_with(backend.clone());

    for size in boundary_sizes(CHUNK) {
        let key = format!("object-{}", size);
        let data = patterned(size);
        backend.insert("bucket", &key, &data);

        let buffer = client.read_object("bucket", &key).unwrap();
        assert_eq!(buffer.len(), size, "length of {}", key);
        assert_eq!(buffer.as_slice(), data.as_slice());
        assert!(buffer.capacity() >= size);
    }
    assert_eq!(backend.reads_closed(), backend.reads_opened());
}

#[test]
fn test_empty_object_reads_as_zero_length() {
    let backend = Arc::new(ScriptedBackend::new().with_object("bucket", "empty", b""));
    let mut client = client_with(backend);

    let buffer = client.read_object("bucket", "empty").unwrap();
    assert!(buffer.is_empty());
    assert!(buffer.capacity() >= CHUNK);
}

#[test]
fn test_write_then_read_round_trip() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut client = client_with(backend.clone());
    let data = patterned(3 * CHUNK + 5);

    let receipt = client.write_object("bucket", "dir/key", &data).unwrap();
    assert_eq!(receipt.size, data.len() as u64);
    assert_eq!(receipt.key, "dir/key");
    assert!(receipt.e_tag.is_some());

    assert_eq!(client.read_object("bucket", "dir/key").unwrap().into_vec(), data);
    assert_eq!(backend.commits(), 1);
}

#[test]
fn test_overwrite_replaces_content() {
    let backend = Arc::new(ScriptedBackend::new().with_object("bucket", "key", b"old content"));
    let mut client = client_with(backend.clone());

    client.write_object("bucket", "key", b"new").unwrap();
    assert_eq!(backend.object("bucket", "key").unwrap(), b"new");
}

#[test]
fn test_open_failure_is_read_open_error() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_object("bucket", "key", b"data")
            .fail_open_read("permission denied"),
    );
    let mut client = client_with(backend);

    let err = client.read_object("bucket", "key").unwrap_err();
    assert!(matches!(err, TransferError::ReadOpen { .. }));
    assert_eq!(client.errors().code(Module::Transfer), 9);
    assert!(client.errors().message(Module::Transfer).contains("permission denied"));
}

#[test]
fn test_mid_stream_failure_reports_progress() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_object("bucket", "key", &patterned(4 * CHUNK))
            .fail_after_bytes(2 * CHUNK + 3),
    );
    let mut client = client_with(backend.clone());

    let err = client.read_object("bucket", "key").unwrap_err();
    match err {
        TransferError::ReadStream { transferred, .. } => assert_eq!(transferred, 2 * CHUNK),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(client.errors().code(Module::Transfer), 12);
    assert_eq!(backend.reads_closed(), 1);
}

#[test]
fn test_close_failure_keeps_successful_read() {
    let data = patterned(2 * CHUNK + 1);
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_object("bucket", "key", &data)
            .fail_close("socket already shut down"),
    );
    let mut client = client_with(backend.clone());

    let buffer = client.read_object("bucket", "key").unwrap();
    assert_eq!(buffer.as_slice(), data.as_slice());
    assert_eq!(backend.reads_closed(), 1);
    assert!(!client.errors().is_error());
}

#[test]
fn test_close_failure_keeps_stream_error() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_object("bucket", "key", &patterned(4 * CHUNK))
            .fail_after_bytes(CHUNK)
            .fail_close("socket already shut down"),
    );
    let mut client = client_with(backend.clone());

    let err = client.read_object("bucket", "key").unwrap_err();
    assert!(matches!(err, TransferError::ReadStream { transferred, .. } if transferred == CHUNK));
    assert_eq!(client.errors().code(Module::Transfer), 12);
    assert!(!client.errors().message(Module::Transfer).contains("socket already shut down"));
    assert_eq!(backend.reads_closed(), 1);
}

#[test]
fn test_short_read_without_end_of_stream_fails() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_object("bucket", "key", &patterned(CHUNK * 2))
            .short_reads(),
    );
    let mut client = client_with(backend);

    let err = client.read_object("bucket", "key").unwrap_err();
    assert!(matches!(err, TransferError::ReadStream { .. }));
}

#[test]
fn test_write_failures() {
    let backend = Arc::new(ScriptedBackend::new().fail_open_write("bucket is read only"));
    let mut client = client_with(backend);
    let err = client.write_object("bucket", "key", b"data").unwrap_err();
    assert!(matches!(err, TransferError::WriteOpen { .. }));
    assert_eq!(client.errors().code(Module::Transfer), 11);

    let backend = Arc::new(ScriptedBackend::new().fail_commit("precondition failed"));
    let mut client = client_with(backend.clone());
    let err = client.write_object("bucket", "key", b"data").unwrap_err();
    assert!(matches!(err, TransferError::WriteCommit { .. }));
    assert_eq!(client.errors().code(Module::Transfer), 13);
    assert!(backend.object("bucket", "key").is_none());
}

#[test]
fn test_empty_write_leaves_object_untouched() {
    let backend = Arc::new(ScriptedBackend::new().with_object("bucket", "key", b"keep me"));
    let mut client = client_with(backend.clone());

    let err = client.write_object("bucket", "key", &[]).unwrap_err();
    assert!(matches!(err, TransferError::InvalidArgument(_)));
    assert_eq!(client.errors().code(Module::Transfer), 3);
    assert_eq!(backend.object("bucket", "key").unwrap(), b"keep me");
    assert_eq!(backend.commits(), 0);
}

#[test]
fn test_error_report_lists_failing_modules() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut client = client_with(backend);

    let report = client.errors().to_error_string();
    assert!(report.contains(ERROR_NOT_FOUND));

    assert!(client.read_object("bucket", "missing").is_err());
    let report = client.errors().to_error_string();
    assert!(report.contains("Transfer:Error(9) : "));
    assert!(!report.contains("Connection:Error"));
    assert_eq!(report.lines().count(), 1);

    client.write_object("bucket", "present", b"x").unwrap();
    assert!(!client.errors().is_error());
}
