//! Fixed-width record slots
//!
//! Each slot in the data section is laid out as:
//!
//! ```text
//! +------------------+
//! | Deleted Flag     | (u8: 0 = live, 1 = deleted)
//! +------------------+
//! | Field 0          | (field width bytes, left-justified, space padded)
//! +------------------+
//! | ...              |
//! +------------------+
//! | Field N-1        |
//! +------------------+
//! ```
//!
//! There are no separators between fields and no per-record checksum.

use crate::errors::{DbError, DbResult};
use crate::schema::{decode_latin1, encode_latin1, SchemaCatalog};

/// Deleted flag value for a live record.
pub const VALID_RECORD: u8 = 0;
/// Deleted flag value for a soft-deleted record.
pub const DELETED_RECORD: u8 = 1;

/// Normalizes a field value to what the file can hold.
///
/// The value is cut to `width` characters, characters outside 8-bit text
/// become `?` and trailing padding (spaces and NULs) is stripped, so a value
/// read back after a reopen is identical to the one held in memory.
pub fn normalize_value(value: &str, width: u16) -> String {
    let truncated: String = value
        .chars()
        .take(usize::from(width))
        .map(|c| if u32::from(c) > 0xFF { '?' } else { c })
        .collect();
    truncated
        .trim_end_matches(|c| c == ' ' || c == '\0')
        .to_string()
}

/// Normalizes a full row against the schema, checking its arity first.
pub fn normalize_values(catalog: &SchemaCatalog, values: &[String]) -> DbResult<Vec<String>> {
    if values.len() != catalog.field_count() {
        return Err(DbError::FieldCountMismatch {
            expected: catalog.field_count(),
            actual: values.len(),
        });
    }

    Ok(values
        .iter()
        .zip(catalog.fields())
        .map(|(value, field)| normalize_value(value, field.max_length))
        .collect())
}

/// In-memory image of one record slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Whether the slot is soft-deleted
    pub deleted: bool,
    /// One value per schema field
    pub values: Vec<String>,
}

impl StoredRecord {
    pub fn live(values: Vec<String>) -> Self {
        Self {
            deleted: false,
            values,
        }
    }

    /// Returns the first-two-field duplicate key.
    pub fn key(&self) -> &[String] {
        key_of(&self.values)
    }

    /// Serializes the slot to exactly `catalog.slot_width()` bytes.
    pub fn serialize(&self, catalog: &SchemaCatalog) -> Vec<u8> {
        let mut buf = Vec::with_capacity(catalog.slot_width() as usize);
        buf.push(if self.deleted {
            DELETED_RECORD
        } else {
            VALID_RECORD
        });

        for (value, field) in self.values.iter().zip(catalog.fields()) {
            let width = usize::from(field.max_length);
            let mut bytes = encode_latin1(value);
            bytes.truncate(width);
            bytes.resize(width, b' ');
            buf.extend_from_slice(&bytes);
        }

        buf
    }

    /// Parses one slot previously produced by [`StoredRecord::serialize`].
    ///
    /// `data` must hold exactly one slot.
    pub fn deserialize(data: &[u8], catalog: &SchemaCatalog) -> Self {
        debug_assert_eq!(data.len() as u64, catalog.slot_width());

        let deleted = data[0] != VALID_RECORD;
        let mut offset = 1;
        let values = catalog
            .fields()
            .iter()
            .map(|field| {
                let width = usize::from(field.max_length);
                let raw = decode_latin1(&data[offset..offset + width]);
                offset += width;
                normalize_value(&raw, field.max_length)
            })
            .collect();

        Self { deleted, values }
    }
}

/// Number of leading fields that form the duplicate key.
pub const KEY_FIELD_COUNT: usize = 2;

/// Returns the duplicate key of a row: its first two fields.
pub fn key_of(values: &[String]) -> &[String] {
    &values[..values.len().min(KEY_FIELD_COUNT)]
}

/// Renders a key for error messages.
pub fn describe_key(values: &[String]) -> String {
    key_of(values).join("/")
}
