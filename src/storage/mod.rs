//! Record storage for flatdb
//!
//! The data file is a header followed by fixed-width slots, one per record
//! ever created. Slots are never removed: deleting a record sets its flag
//! byte, and a later `create` may recycle the slot.
//!
//! # Design Principles
//!
//! - Whole file mirrored in memory at open
//! - Every mutation written through to its slot before it returns
//! - Record numbers are slot indices and never change
//! - Only live records are visible to `read` and `find`

mod criteria;
mod reader;
mod record;
mod store;
mod writer;

/// Zero-based slot index of a record in the data file.
pub type RecordNumber = usize;

pub use criteria::starts_with_ignore_case;
pub use reader::load_records;
pub use record::{normalize_value, StoredRecord, KEY_FIELD_COUNT};
pub use store::{RecordStore, StoreOptions};
pub use writer::{RecordSink, RecordWriter};
