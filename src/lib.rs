//! flatdb - a fixed-schema flat-file record store
//!
//! Records live in one binary file of fixed-width slots. Any number of
//! threads share one [`storage::RecordStore`]; mutation is serialized per
//! record by cookie-based locks, and [`booking::BookingService`] builds the
//! "book this record for a customer" transaction on top.

pub mod booking;
pub mod cli;
pub mod errors;
pub mod lock;
pub mod observability;
pub mod schema;
pub mod storage;

pub use errors::{DbError, DbResult};
