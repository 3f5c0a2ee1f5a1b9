//! Per-record pessimistic locking
//!
//! Every mutation of an existing record (`update`, `delete`) must present the
//! cookie of the lock its caller currently owns on that record. Locks are
//! independent per record: waiting on one record never delays callers working
//! on another.
//!
//! # Guarantees
//!
//! - At most one owner per record at any time
//! - Ownership is proven by the cookie alone; a cookie issued for one record
//!   is rejected on every other record
//! - Release wakes exactly one waiter
//!
//! # Not guaranteed
//!
//! - FIFO wake order
//! - Any timeout: a caller that never unlocks blocks all later lockers of
//!   that record

mod guard;
mod record_lock;

pub use guard::RecordLockGuard;
pub use record_lock::{Acquired, LockCookie, LockState, RecordLock};
