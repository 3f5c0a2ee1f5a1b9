//! Scoped record locks
//!
//! A [`RecordLockGuard`] releases its lock when dropped, so every exit path of
//! a lock/read/validate/write transaction gives the record back, early
//! returns and panics included. Call [`RecordLockGuard::release`] on the
//! success path to observe unlock errors.

use super::record_lock::LockCookie;
use crate::errors::DbResult;
use crate::storage::{RecordNumber, RecordStore};

/// A held lock on one record of a [`RecordStore`].
#[must_use = "dropping the guard releases the lock immediately"]
pub struct RecordLockGuard<'a> {
    store: &'a RecordStore,
    record_number: RecordNumber,
    cookie: LockCookie,
    released: bool,
}

impl<'a> RecordLockGuard<'a> {
    pub(crate) fn new(store: &'a RecordStore, record_number: RecordNumber, cookie: LockCookie) -> Self {
        Self {
            store,
            record_number,
            cookie,
            released: false,
        }
    }

    pub fn record_number(&self) -> RecordNumber {
        self.record_number
    }

    /// The cookie to present to `update` and `delete`.
    pub fn cookie(&self) -> LockCookie {
        self.cookie
    }

    /// Unlocks the record and reports the outcome.
    pub fn release(mut self) -> DbResult<()> {
        self.released = true;
        self.store.unlock(self.record_number, self.cookie)
    }
}

impl Drop for RecordLockGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.store.unlock(self.record_number, self.cookie);
        }
    }
}
