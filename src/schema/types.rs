//! Schema type definitions
//!
//! A data file carries its own schema: an ordered list of fixed-width text
//! fields. The catalog is built once when the store opens and never changes
//! afterwards; field positions and widths are stable for the life of the
//! store.

use serde::Serialize;

/// Magic number identifying a flatdb data file.
pub const MAGIC_COOKIE: u32 = 0x0000_0201;

/// Size of the per-record deleted flag that precedes the field bytes.
pub const DELETED_FLAG_WIDTH: u64 = 1;

/// One column of the fixed-width record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Column name as stored in the header
    pub name: String,
    /// Field width in bytes on disk
    pub max_length: u16,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, max_length: u16) -> Self {
        Self {
            name: name.into(),
            max_length,
        }
    }
}

/// Parsed data file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCatalog {
    pub(crate) magic_number: u32,
    pub(crate) record_byte_width: u32,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) data_offset: u64,
    pub(crate) max_field_length: u16,
}

impl SchemaCatalog {
    /// Builds a catalog for a new data file from its field list.
    ///
    /// The record width and data section offset are derived from the fields,
    /// exactly as they would be after parsing the encoded header.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        let record_byte_width = fields
            .iter()
            .fold(0u32, |width, f| width.saturating_add(u32::from(f.max_length)));
        let data_offset = 4
            + 4
            + 2
            + fields
                .iter()
                .map(|f| 2 + f.name.chars().count() as u64 + 2)
                .sum::<u64>();
        let max_field_length = fields.iter().map(|f| f.max_length).max().unwrap_or(0);

        Self {
            magic_number: MAGIC_COOKIE,
            record_byte_width,
            fields,
            data_offset,
            max_field_length,
        }
    }

    pub fn magic_number(&self) -> u32 {
        self.magic_number
    }

    /// Sum of all field widths, excluding the deleted flag.
    pub fn record_byte_width(&self) -> u32 {
        self.record_byte_width
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Byte offset where the data section begins.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Widest field in the schema.
    pub fn max_field_length(&self) -> u16 {
        self.max_field_length
    }

    /// On-disk size of one record slot, deleted flag included.
    pub fn slot_width(&self) -> u64 {
        DELETED_FLAG_WIDTH + u64::from(self.record_byte_width)
    }

    /// Byte position of the given record slot.
    pub fn record_offset(&self, record_number: usize) -> u64 {
        self.data_offset + record_number as u64 * self.slot_width()
    }

    /// Position of the named column, if the schema has it.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
