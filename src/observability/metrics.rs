//! Metrics registry for flatdb
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the store is reopened
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one open store.
///
/// Relaxed ordering throughout: counters are independent and only read for
/// reporting.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    records_created: AtomicU64,
    records_updated: AtomicU64,
    records_deleted: AtomicU64,
    duplicate_keys_rejected: AtomicU64,
    persistence_failures: AtomicU64,
    locks_acquired: AtomicU64,
    lock_waits: AtomicU64,
    unauthorized_attempts: AtomicU64,
    bookings_completed: AtomicU64,
    bookings_rejected: AtomicU64,
    finds_executed: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    // Record metrics

    pub fn increment_records_created(&self) {
        Self::bump(&self.records_created);
    }

    pub fn increment_records_updated(&self) {
        Self::bump(&self.records_updated);
    }

    pub fn increment_records_deleted(&self) {
        Self::bump(&self.records_deleted);
    }

    pub fn increment_duplicate_keys(&self) {
        Self::bump(&self.duplicate_keys_rejected);
    }

    pub fn increment_persistence_failures(&self) {
        Self::bump(&self.persistence_failures);
    }

    pub fn increment_finds(&self) {
        Self::bump(&self.finds_executed);
    }

    // Lock metrics

    /// Count a granted lock; `waited` if the caller blocked on another owner.
    pub fn record_lock_acquired(&self, waited: bool) {
        Self::bump(&self.locks_acquired);
        if waited {
            Self::bump(&self.lock_waits);
        }
    }

    pub fn increment_unauthorized(&self) {
        Self::bump(&self.unauthorized_attempts);
    }

    // Booking metrics

    pub fn increment_bookings_completed(&self) {
        Self::bump(&self.bookings_completed);
    }

    pub fn increment_bookings_rejected(&self) {
        Self::bump(&self.bookings_rejected);
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            records_created: load(&self.records_created),
            records_updated: load(&self.records_updated),
            records_deleted: load(&self.records_deleted),
            duplicate_keys_rejected: load(&self.duplicate_keys_rejected),
            persistence_failures: load(&self.persistence_failures),
            locks_acquired: load(&self.locks_acquired),
            lock_waits: load(&self.lock_waits),
            unauthorized_attempts: load(&self.unauthorized_attempts),
            bookings_completed: load(&self.bookings_completed),
            bookings_rejected: load(&self.bookings_rejected),
            finds_executed: load(&self.finds_executed),
        }
    }
}

/// Immutable copy of the counters, serializable for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_created: u64,
    pub records_updated: u64,
    pub records_deleted: u64,
    pub duplicate_keys_rejected: u64,
    pub persistence_failures: u64,
    pub locks_acquired: u64,
    pub lock_waits: u64,
    pub unauthorized_attempts: u64,
    pub bookings_completed: u64,
    pub bookings_rejected: u64,
    pub finds_executed: u64,
}
