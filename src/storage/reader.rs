//! Data section loader
//!
//! Reads every slot from the data section into memory at open time. Deleted
//! slots are kept so record numbers stay dense and stable.

use std::io::{self, Read};

use super::record::StoredRecord;
use crate::errors::{DbError, DbResult, Operation};
use crate::schema::SchemaCatalog;

/// Reads slots until end of input.
///
/// The reader must be positioned at the start of the data section. A trailing
/// partial slot (a torn append) is ignored.
pub fn load_records<R: Read>(reader: &mut R, catalog: &SchemaCatalog) -> DbResult<Vec<StoredRecord>> {
    let slot_width = catalog.slot_width() as usize;
    let mut records = Vec::new();
    let mut buf = vec![0u8; slot_width];

    loop {
        let filled = fill_slot(reader, &mut buf).map_err(|e| DbError::IoFailure {
            operation: Operation::Open,
            record_number: Some(records.len()),
            source: e,
        })?;

        if filled < slot_width {
            break;
        }

        records.push(StoredRecord::deserialize(&buf, catalog));
    }

    Ok(records)
}

/// Fills `buf` as far as the input allows; returns the number of bytes read.
fn fill_slot<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use std::io::Cursor;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new(vec![
            FieldDescriptor::new("name", 4),
            FieldDescriptor::new("city", 4),
        ])
    }

    #[test]
    fn test_load_all_slots() {
        let data = b"\x00ab  cd  \x01ef  gh  \x00ij  kl  ".to_vec();
        let records = load_records(&mut Cursor::new(data), &catalog()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].values, vec!["ab", "cd"]);
        assert!(records[1].deleted);
        assert_eq!(records[1].values, vec!["ef", "gh"]);
        assert_eq!(records[2].values, vec!["ij", "kl"]);
    }

    #[test]
    fn test_empty_data_section() {
        let records = load_records(&mut Cursor::new(Vec::new()), &catalog()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_trailing_partial_slot_ignored() {
        let data = b"\x00ab  cd  \x00ef".to_vec();
        let records = load_records(&mut Cursor::new(data), &catalog()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_read_error_is_io_failure() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "bad sector"))
            }
        }

        let err = load_records(&mut Failing, &catalog()).unwrap_err();
        assert!(matches!(
            err,
            DbError::IoFailure {
                operation: Operation::Open,
                ..
            }
        ));
    }
}
