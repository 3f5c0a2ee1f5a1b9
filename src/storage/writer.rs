//! Positioned record writes
//!
//! Every mutation of the data file goes through [`RecordWriter::write_record`]:
//! seek to the slot, write the whole slot, sync. No write-ahead log and no
//! buffering; a crash in the middle of a write can leave that one slot torn,
//! which is accepted.
//!
//! The file handle is shared by all callers, so the seek and the write are
//! done under one mutex and never rely on the position left by a previous
//! call.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::sync::{Mutex, PoisonError};

use super::record::StoredRecord;
use super::RecordNumber;
use crate::schema::SchemaCatalog;

/// Destination for slot writes.
///
/// Implemented for [`File`]; tests substitute sinks that fail on demand.
pub trait RecordSink: Send {
    /// Writes `buf` at absolute byte `offset` and makes it durable.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;
}

impl RecordSink for File {
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buf)?;
        // synchronous writes - mandatory for durability
        self.sync_data()
    }
}

/// Serializes slots and writes them at their fixed offsets.
pub struct RecordWriter {
    sink: Mutex<Box<dyn RecordSink>>,
}

impl RecordWriter {
    pub fn new(sink: Box<dyn RecordSink>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Writes one record slot at `data_offset + n * (1 + record_byte_width)`.
    pub fn write_record(
        &self,
        catalog: &SchemaCatalog,
        record_number: RecordNumber,
        record: &StoredRecord,
    ) -> io::Result<()> {
        let bytes = record.serialize(catalog);
        let offset = catalog.record_offset(record_number);

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_at(offset, &bytes)
    }
}
