//! Error taxonomy for flatdb
//!
//! Every failure the store, the lock table and the booking transaction can
//! report is a variant of [`DbError`]. Nothing is retried inside the core; each
//! error is handed to the immediate caller, which maps it onto whatever the
//! outer layer shows the user.
//!
//! Error codes:
//! - FLATDB_NOT_FOUND (ERROR)
//! - FLATDB_DUPLICATE_KEY (ERROR)
//! - FLATDB_UNAUTHORIZED (ERROR)
//! - FLATDB_IO_FAILURE (ERROR)
//! - FLATDB_RECORD_NOT_FOUND (ERROR)
//! - FLATDB_RECORD_NOT_AVAILABLE (ERROR)
//! - FLATDB_FIELD_COUNT_MISMATCH (ERROR)
//! - FLATDB_INVALID_CUSTOMER_ID (ERROR)
//! - FLATDB_INVALID_HEADER (FATAL)
//! - FLATDB_INVALID_MAGIC_COOKIE (FATAL)

use std::fmt;
use std::io;

use thiserror::Error;

use crate::observability::Severity;
use crate::storage::RecordNumber;

/// The store operation during which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every error kind the core surfaces.
#[derive(Debug, Error)]
pub enum DbError {
    /// Record number out of range, or the slot is soft-deleted
    #[error("record {record_number} not found ({})", not_found_reason(.deleted))]
    NotFound {
        record_number: RecordNumber,
        deleted: bool,
    },

    /// Another live record already carries the same first-two-field key
    #[error("duplicate key on {operation}: {key}")]
    Conflict { operation: Operation, key: String },

    /// Lock cookie absent, owned by someone else, or for another record
    #[error("lock cookie {cookie:#018x} does not own record {record_number}")]
    Unauthorized {
        record_number: RecordNumber,
        cookie: u64,
    },

    /// Disk read or write failed while persisting
    #[error("I/O failure during {operation}{}: {source}", record_suffix(.record_number))]
    IoFailure {
        operation: Operation,
        record_number: Option<RecordNumber>,
        #[source]
        source: io::Error,
    },

    /// Booking target does not exist
    #[error("record {record_number} cannot be booked: not found")]
    RecordNotFound { record_number: RecordNumber },

    /// Booking target is already owned by a customer
    #[error("record {record_number} is not available: booked by customer {owner}")]
    RecordNotAvailable {
        record_number: RecordNumber,
        owner: String,
    },

    /// Value count differs from the schema's field count
    #[error("field count was {actual}, expected {expected}")]
    FieldCountMismatch { expected: usize, actual: usize },

    /// Customer id outside the accepted range
    #[error("invalid customer id: {0}")]
    InvalidCustomerId(String),

    /// Data file header is malformed
    #[error("invalid data header: {0}")]
    InvalidHeader(String),

    /// Data file does not start with the expected magic number
    #[error("invalid magic cookie: found {found:#010x}, expected {expected:#010x}")]
    InvalidMagicCookie { found: u32, expected: u32 },
}

impl DbError {
    /// Convenience constructor for I/O failures on a single record.
    pub fn io(operation: Operation, record_number: RecordNumber, source: io::Error) -> Self {
        DbError::IoFailure {
            operation,
            record_number: Some(record_number),
            source,
        }
    }

    /// Returns the stable error code string.
    pub fn code(&self) -> &'static str {
        match self {
            DbError::NotFound { .. } => "FLATDB_NOT_FOUND",
            DbError::Conflict { .. } => "FLATDB_DUPLICATE_KEY",
            DbError::Unauthorized { .. } => "FLATDB_UNAUTHORIZED",
            DbError::IoFailure { .. } => "FLATDB_IO_FAILURE",
            DbError::RecordNotFound { .. } => "FLATDB_RECORD_NOT_FOUND",
            DbError::RecordNotAvailable { .. } => "FLATDB_RECORD_NOT_AVAILABLE",
            DbError::FieldCountMismatch { .. } => "FLATDB_FIELD_COUNT_MISMATCH",
            DbError::InvalidCustomerId(_) => "FLATDB_INVALID_CUSTOMER_ID",
            DbError::InvalidHeader(_) => "FLATDB_INVALID_HEADER",
            DbError::InvalidMagicCookie { .. } => "FLATDB_INVALID_MAGIC_COOKIE",
        }
    }

    /// Returns the severity level for this error.
    pub fn severity(&self) -> Severity {
        match self {
            DbError::InvalidHeader(_) | DbError::InvalidMagicCookie { .. } => Severity::Fatal,
            DbError::IoFailure {
                operation: Operation::Open,
                ..
            } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether the store could not be opened at all.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

fn not_found_reason(deleted: &bool) -> &'static str {
    if *deleted {
        "deleted"
    } else {
        "no such record"
    }
}

fn record_suffix(record_number: &Option<RecordNumber>) -> String {
    match record_number {
        Some(n) => format!(" of record {}", n),
        None => String::new(),
    }
}

/// Result type for all store, lock and booking operations.
pub type DbResult<T> = Result<T, DbError>;
