//! Tests for log replay on open
//!
//! These tests verify:
//! - Index rebuild from hand-written data files
//! - Corrupt rows refuse to open with the offending offset
//! - Partial final rows under both tail policies
//! - Verify mode (stats only, file untouched)

use std::fs;
use std::path::PathBuf;

use linekv::config::{Config, TailPolicy};
use linekv::store::verify;
use linekv::{ErrorKind, FileRef, Format, KvError, Store, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_data_file(contents: &[u8]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.db");
    fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

fn open_with_policy(path: &PathBuf, policy: TailPolicy) -> linekv::Result<Store> {
    Store::open(Config::builder().path(path).tail_policy(policy).build())
}

// =============================================================================
// Clean Replay Tests
// =============================================================================

#[test]
fn test_replay_empty_file() {
    let (_temp, path) = write_data_file(b"");

    let store = Store::open_path(&path).unwrap();

    assert!(store.is_empty());
    assert_eq!(store.offset(), 0);
}

#[test]
fn test_replay_applies_rows_in_order() {
    let (_temp, path) = write_data_file(b"= a 1\n- b\n= a 2\n! b\n= c \n");

    let store = Store::open_path(&path).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.get(b"a").unwrap(), Value::Bytes(b"2".to_vec()));
    assert_eq!(store.get(b"c").unwrap(), Value::Bytes(Vec::new()));
    assert!(!store.contains(b"b"));
    assert_eq!(store.file_ref(b"a"), Some(FileRef { offset: 10, size: 6 }));
    assert_eq!(store.offset(), 25);
}

#[test]
fn test_replay_tombstone_then_reput() {
    let (_temp, path) = write_data_file(b"= k v1\n! k\n- k\n");

    let store = Store::open_path(&path).unwrap();

    assert_eq!(store.get(b"k").unwrap(), Value::KeyOnly);
    assert_eq!(store.file_ref(b"k"), Some(FileRef { offset: 11, size: 4 }));
}

#[test]
fn test_replay_uses_configured_terminator() {
    let format = Format {
        row_terminator: b';',
        ..Format::default()
    };
    let (_temp, path) = write_data_file(b"= a line\nbreak;- b;");

    let store = Store::open_with_format(&path, format).unwrap();

    assert_eq!(
        store.get(b"a").unwrap(),
        Value::Bytes(b"line\nbreak".to_vec())
    );
    assert_eq!(store.get(b"b").unwrap(), Value::KeyOnly);
}

#[test]
fn test_replay_long_rows() {
    let value = "v".repeat(256 * 1024);
    let contents = format!("= big {}\n- small\n", value);
    let (_temp, path) = write_data_file(contents.as_bytes());

    let store = Store::open_path(&path).unwrap();

    assert_eq!(store.get(b"big").unwrap(), Value::Bytes(value.into_bytes()));
    assert_eq!(store.get(b"small").unwrap(), Value::KeyOnly);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_corrupt_row_refuses_to_open() {
    let (_temp, path) = write_data_file(b"= a 1\n? junk\n= b 2\n");

    let err = Store::open_path(&path).err().unwrap();

    assert_eq!(err.kind(), ErrorKind::CorruptLog);
    match err {
        KvError::CorruptLog { offset, source } => {
            assert_eq!(offset, 6);
            assert_eq!(source.kind(), ErrorKind::UnknownOperation);
        }
        other => panic!("expected CorruptLog, got {:?}", other),
    }
}

#[test]
fn test_corrupt_row_fails_even_when_truncating() {
    // Only an unterminated tail is eligible for truncation
    let (_temp, path) = write_data_file(b"= a 1\n=b\n");

    let err = open_with_policy(&path, TailPolicy::Truncate).err().unwrap();

    assert_eq!(err.kind(), ErrorKind::CorruptLog);
}

// =============================================================================
// Partial Tail Tests
// =============================================================================

#[test]
fn test_partial_tail_fails_by_default() {
    let (_temp, path) = write_data_file(b"= a 1\n= b 2");

    let err = open_with_policy(&path, TailPolicy::Fail).err().unwrap();

    match err {
        KvError::CorruptLog { offset, .. } => assert_eq!(offset, 6),
        other => panic!("expected CorruptLog, got {:?}", other),
    }
    // File untouched
    assert_eq!(fs::read(&path).unwrap(), b"= a 1\n= b 2");
}

#[test]
fn test_partial_tail_truncated() {
    let (_temp, path) = write_data_file(b"= a 1\n- b\n= c par");

    let store = open_with_policy(&path, TailPolicy::Truncate).unwrap();

    assert_eq!(store.len(), 2);
    assert!(!store.contains(b"c"));
    assert_eq!(store.offset(), 10);
    assert_eq!(fs::read(&path).unwrap(), b"= a 1\n- b\n");

    // New rows land right after the last complete row
    store.put(b"c", Some(b"3")).unwrap();
    assert_eq!(store.file_ref(b"c"), Some(FileRef { offset: 10, size: 6 }));
    store.close().unwrap();

    let store = Store::open_path(&path).unwrap();
    assert_eq!(store.get(b"c").unwrap(), Value::Bytes(b"3".to_vec()));
}

#[test]
fn test_short_partial_tail_truncated() {
    let (_temp, path) = write_data_file(b"- a\n=");

    let store = open_with_policy(&path, TailPolicy::Truncate).unwrap();

    assert_eq!(store.offset(), 4);
    assert_eq!(fs::read(&path).unwrap(), b"- a\n");
}

// =============================================================================
// Verify Tests
// =============================================================================

#[test]
fn test_verify_reports_without_modifying() {
    let contents = b"= a 1\n! a\n- b\n= c";
    let (_temp, path) = write_data_file(contents);

    let result = verify(&path, &Format::default()).unwrap();

    assert_eq!(result.rows_replayed, 3);
    assert_eq!(result.tombstones, 1);
    assert_eq!(result.live_keys, 1);
    assert_eq!(result.end_offset, 14);
    assert_eq!(result.partial_tail_bytes, 3);
    assert_eq!(fs::read(&path).unwrap(), contents);
}

#[test]
fn test_verify_corrupt_file() {
    let (_temp, path) = write_data_file(b"- a\nnot a row\n");

    let err = verify(&path, &Format::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CorruptLog);
}
