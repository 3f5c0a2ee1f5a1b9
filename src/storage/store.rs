//! The record store
//!
//! An in-memory mirror of every slot in the data file, soft-deleted slots
//! included, kept in step with the file by positioned writes.
//!
//! # Concurrency
//!
//! - The slot vector sits behind an `RwLock`; it is write-locked only while
//!   `create` appends a slot.
//! - Each slot has its own row mutex (held briefly, never across I/O) and its
//!   own [`RecordLock`].
//! - `create` runs its duplicate check and slot allocation inside one
//!   store-wide mutex taken by no other operation.
//! - `read` and `find` take no record lock and may observe a row while an
//!   update to it is in flight; callers re-validate after locking.
//!
//! # Persistence order
//!
//! `create` and `update` write the file first and only then change memory, so
//! a failed write leaves memory as it was. `delete` marks the slot deleted in
//! memory before writing, and keeps it deleted if the write fails: a failed
//! delete must not resurrect the record.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use super::criteria;
use super::reader::load_records;
use super::record::{describe_key, key_of, normalize_values, StoredRecord};
use super::writer::{RecordSink, RecordWriter};
use super::RecordNumber;
use crate::errors::{DbError, DbResult, Operation};
use crate::lock::{LockCookie, LockState, RecordLock, RecordLockGuard};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::schema::SchemaCatalog;

/// Options for an open store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Emit a JSON log line for every mutation, lock and booking
    pub log_events: bool,
}

/// One record slot: its row and its lock.
#[derive(Debug)]
struct Slot {
    row: Mutex<StoredRecord>,
    lock: RecordLock,
}

impl Slot {
    fn new(record: StoredRecord) -> Self {
        Self {
            row: Mutex::new(record),
            lock: RecordLock::new(),
        }
    }

    fn row(&self) -> MutexGuard<'_, StoredRecord> {
        self.row.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_deleted(&self) -> bool {
        self.row().deleted
    }
}

/// A flat-file record store.
pub struct RecordStore {
    catalog: SchemaCatalog,
    slots: RwLock<Vec<Arc<Slot>>>,
    create_guard: Mutex<()>,
    writer: RecordWriter,
    metrics: MetricsRegistry,
    options: StoreOptions,
}

impl RecordStore {
    /// Opens an existing data file for reading and writing.
    ///
    /// # Errors
    ///
    /// - `IoFailure` (operation `Open`) if the file cannot be opened or read
    /// - `InvalidMagicCookie` / `InvalidHeader` for a malformed header
    pub fn open(path: &Path) -> DbResult<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Opens an existing data file with explicit options.
    pub fn open_with_options(path: &Path, options: StoreOptions) -> DbResult<Self> {
        let path_display = path.display().to_string();
        if options.log_events {
            Logger::event(Event::StoreOpenBegin, &[("path", &path_display)]);
        }

        let result = Self::open_file(path, options);

        if options.log_events {
            match &result {
                Ok(store) => Logger::event(
                    Event::StoreOpened,
                    &[
                        ("path", &path_display),
                        ("fields", &store.catalog.field_count().to_string()),
                        ("records", &store.len().to_string()),
                        ("live", &store.live_count().to_string()),
                    ],
                ),
                Err(e) => Logger::event(
                    Event::StoreOpenFailed,
                    &[
                        ("path", &path_display),
                        ("code", e.code()),
                        ("error", &e.to_string()),
                    ],
                ),
            }
        }

        result
    }

    /// Writes a header-only data file for `catalog` and opens it.
    ///
    /// Refuses to overwrite an existing file.
    pub fn initialize(path: &Path, catalog: &SchemaCatalog, options: StoreOptions) -> DbResult<Self> {
        let header = catalog.encode()?;
        let init_failed = |source| DbError::IoFailure {
            operation: Operation::Open,
            record_number: None,
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(init_failed)?;
        file.write_all(&header).map_err(init_failed)?;
        file.sync_all().map_err(init_failed)?;
        drop(file);

        if options.log_events {
            Logger::event(
                Event::StoreInitialized,
                &[
                    ("path", &path.display().to_string()),
                    ("fields", &catalog.field_count().to_string()),
                    ("record_width", &catalog.record_byte_width().to_string()),
                ],
            );
        }

        Self::open_with_options(path, options)
    }

    fn open_file(path: &Path, options: StoreOptions) -> DbResult<Self> {
        let open_failed = |source| DbError::IoFailure {
            operation: Operation::Open,
            record_number: None,
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(open_failed)?;
        let reader = File::open(path).map_err(open_failed)?;

        Self::load(BufReader::new(reader), Box::new(file), options)
    }

    /// Builds a store from a complete file image and a sink for writes.
    ///
    /// `source` must start at the header. Writes go to `sink` at the same
    /// offsets they would have in the file.
    pub fn load<R: Read>(mut source: R, sink: Box<dyn RecordSink>, options: StoreOptions) -> DbResult<Self> {
        let catalog = SchemaCatalog::parse(&mut source)?;
        let records = load_records(&mut source, &catalog)?;
        let slots = records.into_iter().map(|r| Arc::new(Slot::new(r))).collect();

        Ok(Self {
            catalog,
            slots: RwLock::new(slots),
            create_guard: Mutex::new(()),
            writer: RecordWriter::new(sink),
            metrics: MetricsRegistry::new(),
            options,
        })
    }

    /// The schema of this store.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Number of slots, deleted ones included.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-deleted records.
    pub fn live_count(&self) -> usize {
        self.snapshot().iter().filter(|s| !s.is_deleted()).count()
    }

    /// Reads the values of a live record.
    ///
    /// The returned vector is a copy; changing it does not touch the store.
    pub fn read(&self, record_number: RecordNumber) -> DbResult<Vec<String>> {
        let slot = self.slot(record_number)?;
        let row = slot.row();
        if row.deleted {
            return Err(not_found(record_number, true));
        }
        Ok(row.values.clone())
    }

    /// Returns the numbers of all live records matching `criteria`, ascending.
    ///
    /// Criteria line up with the schema fields; `None` matches any value and
    /// `Some(prefix)` matches values starting with `prefix`, ignoring case.
    /// No lock is taken, so the result can be stale by the time it is used.
    pub fn find(&self, criteria: &[Option<&str>]) -> Vec<RecordNumber> {
        self.metrics.increment_finds();

        self.snapshot()
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                let row = slot.row();
                !row.deleted && criteria::matches(&row.values, criteria)
            })
            .map(|(n, _)| n)
            .collect()
    }

    /// Creates a record and returns its number.
    ///
    /// Reuses the lowest-numbered deleted slot that nobody holds a lock
    /// request on, otherwise appends.
    ///
    /// # Errors
    ///
    /// - `FieldCountMismatch` if `values` does not match the schema
    /// - `Conflict` if a live record has the same first two fields
    /// - `IoFailure` (operation `Create`) if the write fails; memory is
    ///   unchanged
    pub fn create(&self, values: &[String]) -> DbResult<RecordNumber> {
        let values = normalize_values(&self.catalog, values)?;

        let _create = self.create_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let slots = self.snapshot();

        if slots.iter().any(|slot| {
            let row = slot.row();
            !row.deleted && row.key() == key_of(&values)
        }) {
            self.metrics.increment_duplicate_keys();
            return Err(DbError::Conflict {
                operation: Operation::Create,
                key: describe_key(&values),
            });
        }

        let record = StoredRecord::live(values);
        let reusable = slots
            .iter()
            .position(|slot| slot.is_deleted() && slot.lock.is_idle());

        let record_number = match reusable {
            Some(n) => {
                self.persist(Operation::Create, n, &record)?;
                *slots[n].row() = record;
                n
            }
            None => {
                let n = slots.len();
                self.persist(Operation::Create, n, &record)?;
                self.slots
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Arc::new(Slot::new(record)));
                n
            }
        };

        self.metrics.increment_records_created();
        self.log(
            Event::RecordCreated,
            &[
                ("record", &record_number.to_string()),
                ("reused", &reusable.is_some().to_string()),
            ],
        );
        Ok(record_number)
    }

    /// Replaces the values of a live record the caller holds the lock on.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist or is deleted
    /// - `Unauthorized` if `cookie` does not own the lock on this record
    /// - `FieldCountMismatch` if `values` does not match the schema
    /// - `Conflict` if another live record has the same first two fields
    /// - `IoFailure` (operation `Update`) if the write fails; memory is
    ///   unchanged
    pub fn update(&self, record_number: RecordNumber, values: &[String], cookie: LockCookie) -> DbResult<()> {
        let slot = self.live_slot(record_number)?;
        self.check_owner(&slot, record_number, cookie)?;
        let values = normalize_values(&self.catalog, values)?;

        let duplicate = self.snapshot().iter().enumerate().any(|(n, other)| {
            if n == record_number {
                return false;
            }
            let row = other.row();
            !row.deleted && row.key() == key_of(&values)
        });
        if duplicate {
            self.metrics.increment_duplicate_keys();
            return Err(DbError::Conflict {
                operation: Operation::Update,
                key: describe_key(&values),
            });
        }

        let record = StoredRecord::live(values);
        self.persist(Operation::Update, record_number, &record)?;
        *slot.row() = record;

        self.metrics.increment_records_updated();
        self.log(Event::RecordUpdated, &[("record", &record_number.to_string())]);
        Ok(())
    }

    /// Soft-deletes a live record the caller holds the lock on.
    ///
    /// The slot keeps its number and may be recycled by a later `create`
    /// once its lock is released.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist or is already deleted
    /// - `Unauthorized` if `cookie` does not own the lock on this record
    /// - `IoFailure` (operation `Delete`) if the write fails; the record
    ///   stays deleted in memory
    pub fn delete(&self, record_number: RecordNumber, cookie: LockCookie) -> DbResult<()> {
        let slot = self.live_slot(record_number)?;
        self.check_owner(&slot, record_number, cookie)?;

        let tombstone = {
            let mut row = slot.row();
            row.deleted = true;
            row.clone()
        };
        self.persist(Operation::Delete, record_number, &tombstone)?;

        self.metrics.increment_records_deleted();
        self.log(Event::RecordDeleted, &[("record", &record_number.to_string())]);
        Ok(())
    }

    /// Blocks until the caller owns the lock on a live record.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record does not exist, is deleted, or was deleted by
    /// the previous owner while the caller waited.
    pub fn lock(&self, record_number: RecordNumber) -> DbResult<LockCookie> {
        let slot = self.live_slot(record_number)?;
        let acquired = slot.lock.acquire();

        if slot.is_deleted() {
            slot.lock.release(acquired.cookie);
            return Err(not_found(record_number, true));
        }

        self.metrics.record_lock_acquired(acquired.waited);
        self.log(
            Event::RecordLocked,
            &[
                ("record", &record_number.to_string()),
                ("waited", &acquired.waited.to_string()),
            ],
        );
        Ok(acquired.cookie)
    }

    /// Releases a lock obtained from [`RecordStore::lock`].
    ///
    /// Works on deleted records so a caller can unlock after deleting.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record number is out of range
    /// - `Unauthorized` if `cookie` does not own the lock on this record
    pub fn unlock(&self, record_number: RecordNumber, cookie: LockCookie) -> DbResult<()> {
        let slot = self.slot(record_number)?;
        if !slot.lock.release(cookie) {
            self.metrics.increment_unauthorized();
            return Err(unauthorized(record_number, cookie));
        }

        self.log(Event::RecordUnlocked, &[("record", &record_number.to_string())]);
        Ok(())
    }

    /// Locks a record and returns a guard that unlocks it when dropped.
    pub fn lock_guard(&self, record_number: RecordNumber) -> DbResult<RecordLockGuard<'_>> {
        let cookie = self.lock(record_number)?;
        Ok(RecordLockGuard::new(self, record_number, cookie))
    }

    /// Current lock state of a record.
    pub fn lock_state(&self, record_number: RecordNumber) -> DbResult<LockState> {
        Ok(self.slot(record_number)?.lock.state())
    }

    pub(crate) fn log(&self, event: Event, fields: &[(&str, &str)]) {
        if self.options.log_events {
            Logger::event(event, fields);
        }
    }

    fn snapshot(&self) -> Vec<Arc<Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn slot(&self, record_number: RecordNumber) -> DbResult<Arc<Slot>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(record_number)
            .cloned()
            .ok_or_else(|| not_found(record_number, false))
    }

    fn live_slot(&self, record_number: RecordNumber) -> DbResult<Arc<Slot>> {
        let slot = self.slot(record_number)?;
        if slot.is_deleted() {
            return Err(not_found(record_number, true));
        }
        Ok(slot)
    }

    fn check_owner(&self, slot: &Slot, record_number: RecordNumber, cookie: LockCookie) -> DbResult<()> {
        if slot.lock.is_owned_by(cookie) {
            Ok(())
        } else {
            self.metrics.increment_unauthorized();
            Err(unauthorized(record_number, cookie))
        }
    }

    fn persist(&self, operation: Operation, record_number: RecordNumber, record: &StoredRecord) -> DbResult<()> {
        self.writer
            .write_record(&self.catalog, record_number, record)
            .map_err(|e| {
                self.metrics.increment_persistence_failures();
                self.log(
                    Event::PersistenceFailed,
                    &[
                        ("operation", operation.as_str()),
                        ("record", &record_number.to_string()),
                        ("error", &e.to_string()),
                    ],
                );
                DbError::io(operation, record_number, e)
            })
    }
}

fn not_found(record_number: RecordNumber, deleted: bool) -> DbError {
    DbError::NotFound {
        record_number,
        deleted,
    }
}

fn unauthorized(record_number: RecordNumber, cookie: LockCookie) -> DbError {
    DbError::Unauthorized {
        record_number,
        cookie: cookie.value(),
    }
}
