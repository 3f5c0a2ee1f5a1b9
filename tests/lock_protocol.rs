//! Record Lock Protocol Tests
//!
//! - Mutation requires the cookie that owns the record's lock
//! - A cookie is only good for the record it was issued on
//! - Unlock always lets the next locker through
//! - Locks on different records never wait for each other

use flatdb::lock::{LockCookie, LockState};
use flatdb::schema::{FieldDescriptor, SchemaCatalog};
use flatdb::storage::{RecordStore, StoreOptions};
use flatdb::DbError;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_store(temp_dir: &TempDir, records: usize) -> Arc<RecordStore> {
    let catalog = SchemaCatalog::new(vec![
        FieldDescriptor::new("name", 16),
        FieldDescriptor::new("location", 16),
        FieldDescriptor::new("owner", 8),
    ]);
    let path = temp_dir.path().join("locks.db");
    let store = RecordStore::initialize(&path, &catalog, StoreOptions::default()).unwrap();
    for i in 0..records {
        store
            .create(&[format!("Firm {}", i), "Smallville".to_string(), String::new()])
            .unwrap();
    }
    Arc::new(store)
}

fn values(owner: &str) -> Vec<String> {
    vec!["Firm 0".to_string(), "Smallville".to_string(), owner.to_string()]
}

// =============================================================================
// Ownership
// =============================================================================

#[test]
fn test_cookie_from_other_record_is_unauthorized() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 2);

    let cookie_0 = store.lock(0).unwrap();
    let cookie_1 = store.lock(1).unwrap();

    assert!(matches!(
        store.update(0, &values("1"), cookie_1),
        Err(DbError::Unauthorized { record_number: 0, .. })
    ));
    assert!(matches!(
        store.delete(1, cookie_0),
        Err(DbError::Unauthorized { record_number: 1, .. })
    ));
    assert!(matches!(
        store.unlock(1, cookie_0),
        Err(DbError::Unauthorized { .. })
    ));

    store.update(0, &values("1"), cookie_0).unwrap();
    store.unlock(0, cookie_0).unwrap();
    store.unlock(1, cookie_1).unwrap();
    assert_eq!(store.metrics().snapshot().unauthorized_attempts, 3);
}

#[test]
fn test_mutation_without_lock_is_unauthorized() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 1);

    let forged = LockCookie::from_raw(0xdead_beef);
    assert!(matches!(
        store.update(0, &values("9"), forged),
        Err(DbError::Unauthorized { .. })
    ));
    assert!(matches!(
        store.delete(0, forged),
        Err(DbError::Unauthorized { .. })
    ));
    assert_eq!(store.read(0).unwrap(), values(""));
}

#[test]
fn test_stale_cookie_rejected_after_unlock() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 1);

    let cookie = store.lock(0).unwrap();
    store.unlock(0, cookie).unwrap();

    assert!(matches!(
        store.update(0, &values("1"), cookie),
        Err(DbError::Unauthorized { .. })
    ));
    assert!(store.unlock(0, cookie).is_err());
}

#[test]
fn test_lock_checks_record() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 1);

    assert!(matches!(
        store.lock(7),
        Err(DbError::NotFound { record_number: 7, deleted: false })
    ));
    assert!(matches!(
        store.unlock(7, LockCookie::from_raw(1)),
        Err(DbError::NotFound { .. })
    ));
}

// =============================================================================
// Blocking behaviour
// =============================================================================

#[test]
fn test_unlock_then_lock_from_other_thread_does_not_block() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 1);

    for _ in 0..20 {
        let cookie = store.lock(0).unwrap();
        store.unlock(0, cookie).unwrap();

        let (tx, rx) = mpsc::channel();
        let store_clone = Arc::clone(&store);
        let handle = thread::spawn(move || {
            let cookie = store_clone.lock(0).unwrap();
            tx.send(()).unwrap();
            store_clone.unlock(0, cookie).unwrap();
        });

        rx.recv_timeout(Duration::from_secs(5))
            .expect("lock after unlock must not block");
        handle.join().unwrap();
    }
    assert_eq!(store.lock_state(0).unwrap(), LockState::Unlocked);
}

#[test]
fn test_waiter_blocks_until_unlock() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 1);
    let cookie = store.lock(0).unwrap();

    let (tx, rx) = mpsc::channel();
    let store_clone = Arc::clone(&store);
    let handle = thread::spawn(move || {
        let cookie = store_clone.lock(0).unwrap();
        tx.send(cookie).unwrap();
        cookie
    });

    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    store.unlock(0, cookie).unwrap();

    let waiter_cookie = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(handle.join().unwrap(), waiter_cookie);
    assert_eq!(store.lock_state(0).unwrap(), LockState::Owned(waiter_cookie));
    store.unlock(0, waiter_cookie).unwrap();
    assert_eq!(store.metrics().snapshot().lock_waits, 1);
}

#[test]
fn test_locks_on_different_records_are_independent() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 2);
    let held = store.lock(0).unwrap();

    let (tx, rx) = mpsc::channel();
    let store_clone = Arc::clone(&store);
    thread::spawn(move || {
        let cookie = store_clone.lock(1).unwrap();
        store_clone.unlock(1, cookie).unwrap();
        tx.send(()).unwrap();
    });

    rx.recv_timeout(Duration::from_secs(5))
        .expect("record 1 must not wait for record 0");
    store.unlock(0, held).unwrap();
}

#[test]
fn test_waiter_sees_delete_as_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_store(&temp_dir, 1);
    let cookie = store.lock(0).unwrap();

    let store_clone = Arc::clone(&store);
    let handle = thread::spawn(move || store_clone.lock(0));

    thread::sleep(Duration::from_millis(100));
    store.delete(0, cookie).unwrap();
    store.unlock(0, cookie).unwrap();

    assert!(matches!(
        handle.join().unwrap(),
        Err(DbError::NotFound { deleted: true, .. })
    ));
    assert_eq!(store.lock_state(0).unwrap(), LockState::Unlocked);
}
