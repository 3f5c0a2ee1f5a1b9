//! Per-record lock queue
//!
//! State machine, independent for every record:
//!
//! ```text
//! Unlocked --acquire--> Owned(cookie)
//! Owned    --acquire--> Owned + Pending (caller blocks)
//! Owned    --release--> Unlocked, or one woken waiter takes ownership
//! ```
//!
//! Each waiter registers an entry with a fresh cookie and sleeps on the
//! record's condition variable until no entry is owned. Release removes the
//! owner's entry and wakes one waiter. Wake order is whatever the condition
//! variable picks, so a waiter can be overtaken indefinitely under heavy
//! contention; there is no timeout.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Token returned by a successful lock; authorizes update, delete and unlock
/// on the record it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockCookie(u64);

impl LockCookie {
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LockCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Observable state of one record's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No entries
    Unlocked,
    /// Waiters registered, nobody owns the lock yet
    Pending,
    /// One entry owns the lock
    Owned(LockCookie),
}

/// Result of a successful [`RecordLock::acquire`].
#[derive(Debug, Clone, Copy)]
pub struct Acquired {
    pub cookie: LockCookie,
    /// Whether the caller had to wait for another owner
    pub waited: bool,
}

#[derive(Debug)]
struct LockEntry {
    cookie: LockCookie,
    owned: bool,
}

/// Mutual exclusion for a single record.
#[derive(Debug, Default)]
pub struct RecordLock {
    entries: Mutex<Vec<LockEntry>>,
    released: Condvar,
}

impl RecordLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<LockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a request and blocks until it owns the lock.
    pub fn acquire(&self) -> Acquired {
        let mut entries = self.entries();

        let cookie = fresh_cookie(&entries);
        entries.push(LockEntry {
            cookie,
            owned: false,
        });

        let mut waited = false;
        while entries.iter().any(|e| e.owned) {
            waited = true;
            entries = self
                .released
                .wait(entries)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if let Some(entry) = entries.iter_mut().find(|e| e.cookie == cookie) {
            entry.owned = true;
        }

        Acquired { cookie, waited }
    }

    /// Releases the lock if `cookie` currently owns it.
    ///
    /// Returns `false` (and changes nothing) otherwise.
    pub fn release(&self, cookie: LockCookie) -> bool {
        let mut entries = self.entries();
        let Some(index) = entries.iter().position(|e| e.owned && e.cookie == cookie) else {
            return false;
        };

        entries.remove(index);
        drop(entries);

        // exactly one (or zero) blocked waiters
        self.released.notify_one();
        true
    }

    /// Returns whether `cookie` is the current owner.
    pub fn is_owned_by(&self, cookie: LockCookie) -> bool {
        self.entries()
            .iter()
            .any(|e| e.owned && e.cookie == cookie)
    }

    pub fn state(&self) -> LockState {
        let entries = self.entries();
        match entries.iter().find(|e| e.owned) {
            Some(owner) => LockState::Owned(owner.cookie),
            None if entries.is_empty() => LockState::Unlocked,
            None => LockState::Pending,
        }
    }

    /// Returns whether no request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.entries().is_empty()
    }

    /// Number of outstanding requests, owner included.
    pub fn queue_len(&self) -> usize {
        self.entries().len()
    }
}

/// Random cookie, unique among this record's outstanding entries.
fn fresh_cookie(entries: &[LockEntry]) -> LockCookie {
    loop {
        let cookie = LockCookie(rand::random());
        if entries.iter().all(|e| e.cookie != cookie) {
            return cookie;
        }
    }
}
