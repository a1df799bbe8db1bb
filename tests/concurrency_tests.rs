//! Tests for concurrent access
//!
//! These tests verify:
//! - Concurrent writers never produce torn rows or lost index entries
//! - Readers see complete values while writers append
//! - Scoped exclusive sections make compound operations atomic

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use linekv::{ErrorKind, Store, Value};
use tempfile::TempDir;

fn setup_shared_store() -> (TempDir, Arc<Store>) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path().join("data.db")).unwrap();
    (temp_dir, Arc::new(store))
}

#[test]
fn test_concurrent_writers() {
    let (temp, store) = setup_shared_store();
    let threads = 8;
    let per_thread = 200;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let key = format!("t{}-k{}", t, i);
                    let value = format!("value-{}-{}", t, i);
                    store.put(key.as_bytes(), Some(value.as_bytes())).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), threads * per_thread);
    assert_eq!(
        store.get(b"t3-k42").unwrap(),
        Value::Bytes(b"value-3-42".to_vec())
    );

    // Every row landed whole: the file replays to the same index
    let offset = store.offset();
    let store = Arc::try_unwrap(store).ok().unwrap();
    store.close().unwrap();
    let reopened = Store::open_path(temp.path().join("data.db")).unwrap();
    assert_eq!(reopened.len(), threads * per_thread);
    assert_eq!(reopened.offset(), offset);
}

#[test]
fn test_readers_during_writes() {
    let (_temp, store) = setup_shared_store();
    store.put(b"counter", Some(b"0")).unwrap();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 1..=500 {
                store
                    .put(b"counter", Some(i.to_string().as_bytes()))
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut last = 0u32;
                for _ in 0..500 {
                    let value = store.get(b"counter").unwrap().into_bytes().unwrap();
                    let n: u32 = String::from_utf8(value).unwrap().parse().unwrap();
                    assert!(n >= last, "value went backwards: {} < {}", n, last);
                    last = n;
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.get(b"counter").unwrap(), Value::Bytes(b"500".to_vec()));
}

#[test]
fn test_atomically_check_then_delete() {
    let (_temp, store) = setup_shared_store();
    store.put(b"ticket", None).unwrap();
    let claimed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let claimed = Arc::clone(&claimed);
            thread::spawn(move || {
                store
                    .atomically(|guard| {
                        if guard.contains(b"ticket") {
                            guard.delete(b"ticket")?;
                            claimed.fetch_add(1, Ordering::SeqCst);
                        }
                        Ok(())
                    })
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(claimed.load(Ordering::SeqCst), 1);
    assert_eq!(store.get(b"ticket").unwrap_err().kind(), ErrorKind::KeyNotFound);
}

#[test]
fn test_lock_guard_sequence() {
    let (_temp, store) = setup_shared_store();

    {
        let mut guard = store.lock();
        guard.put(b"a", Some(b"1")).unwrap();
        let current = guard.get(b"a").unwrap().into_bytes().unwrap();
        let mut next = current.clone();
        next.push(b'1');
        guard.put(b"a", Some(&next)).unwrap();
        assert_eq!(guard.len(), 1);
        assert!(guard.file_ref(b"a").is_some());
        assert_eq!(guard.offset(), 13);
    }

    assert_eq!(store.get(b"a").unwrap(), Value::Bytes(b"11".to_vec()));
}

#[test]
fn test_atomically_propagates_errors_without_rollback() {
    let (_temp, store) = setup_shared_store();

    let err = store
        .atomically(|guard| {
            guard.put(b"first", Some(b"1"))?;
            guard.put(b"", None)?;
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyKey);
    assert_eq!(store.get(b"first").unwrap(), Value::Bytes(b"1".to_vec()));
}
