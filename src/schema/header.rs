//! Data file header codec
//!
//! Header layout (all integers big-endian):
//!
//! ```text
//! +----------------------+
//! | Magic Number         | (u32)
//! +----------------------+
//! | Record Byte Width    | (u32, excludes the deleted flag)
//! +----------------------+
//! | Field Count          | (u16)
//! +----------------------+
//! | Field Descriptor     | repeated Field Count times:
//! |   Name Length        |   (u16)
//! |   Name               |   (Name Length bytes, 8-bit text)
//! |   Field Length       |   (u16)
//! +----------------------+
//! ```
//!
//! The data section begins immediately after the last descriptor.

use std::io::{self, Read};

use super::types::{FieldDescriptor, SchemaCatalog, MAGIC_COOKIE};
use crate::errors::{DbError, DbResult, Operation};

/// Decodes 8-bit text; every byte maps to the code point of the same value.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encodes text as 8-bit bytes; characters above U+00FF become `?`.
pub(crate) fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> DbResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DbError::InvalidHeader(format!("header ended while reading {}", what))
        } else {
            DbError::IoFailure {
                operation: Operation::Open,
                record_number: None,
                source: e,
            }
        }
    })
}

fn read_u16<R: Read>(reader: &mut R, what: &str) -> DbResult<u16> {
    let mut buf = [0u8; 2];
    read_header_bytes(reader, &mut buf, what)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> DbResult<u32> {
    let mut buf = [0u8; 4];
    read_header_bytes(reader, &mut buf, what)?;
    Ok(u32::from_be_bytes(buf))
}

impl SchemaCatalog {
    /// Parses the header from the start of a data file.
    ///
    /// On success the reader is positioned at the first byte of the data
    /// section.
    ///
    /// # Errors
    ///
    /// - `InvalidMagicCookie` if the file is not a flatdb data file
    /// - `InvalidHeader` if the header is truncated or inconsistent
    /// - `IoFailure` (operation `Open`) for any other read error
    pub fn parse<R: Read>(reader: &mut R) -> DbResult<Self> {
        let magic_number = read_u32(reader, "magic cookie")?;
        if magic_number != MAGIC_COOKIE {
            return Err(DbError::InvalidMagicCookie {
                found: magic_number,
                expected: MAGIC_COOKIE,
            });
        }

        let record_byte_width = read_u32(reader, "record width")?;
        let field_count = read_u16(reader, "field count")?;

        let mut fields = Vec::with_capacity(usize::from(field_count));
        for i in 0..field_count {
            let name_length = read_u16(reader, "field name length")?;
            let mut name = vec![0u8; usize::from(name_length)];
            reader.read_exact(&mut name).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    DbError::InvalidHeader(format!(
                        "field {} name shorter than declared length {}",
                        i, name_length
                    ))
                } else {
                    DbError::IoFailure {
                        operation: Operation::Open,
                        record_number: None,
                        source: e,
                    }
                }
            })?;
            let max_length = read_u16(reader, "field length")?;
            fields.push(FieldDescriptor::new(decode_latin1(&name), max_length));
        }

        let catalog = SchemaCatalog::new(fields);
        if catalog.record_byte_width != record_byte_width {
            return Err(DbError::InvalidHeader(format!(
                "record width was {}, fields sum to {}",
                record_byte_width, catalog.record_byte_width
            )));
        }

        Ok(catalog)
    }

    /// Serializes the header, the inverse of [`SchemaCatalog::parse`].
    ///
    /// # Errors
    ///
    /// `InvalidHeader` if the field count or a field name's length does not
    /// fit the header's 16-bit length prefixes.
    pub fn encode(&self) -> DbResult<Vec<u8>> {
        let field_count = u16::try_from(self.fields.len()).map_err(|_| {
            DbError::InvalidHeader(format!(
                "{} fields, at most {} fit the header",
                self.fields.len(),
                u16::MAX
            ))
        })?;

        let mut buf = Vec::with_capacity(self.data_offset as usize);
        buf.extend_from_slice(&self.magic_number.to_be_bytes());
        buf.extend_from_slice(&self.record_byte_width.to_be_bytes());
        buf.extend_from_slice(&field_count.to_be_bytes());

        for field in &self.fields {
            let name = encode_latin1(&field.name);
            let name_length = u16::try_from(name.len()).map_err(|_| {
                DbError::InvalidHeader(format!(
                    "field name of {} bytes, at most {} fit the header",
                    name.len(),
                    u16::MAX
                ))
            })?;
            buf.extend_from_slice(&name_length.to_be_bytes());
            buf.extend_from_slice(&name);
            buf.extend_from_slice(&field.max_length.to_be_bytes());
        }

        Ok(buf)
    }
}
