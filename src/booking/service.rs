//! The booking transaction
//!
//! `book` is the only multi-step write in flatdb: lock, read, check the
//! owner column, write, unlock. The lock is held through a
//! [`RecordLockGuard`](crate::lock::RecordLockGuard), so every early return
//! gives it back.

use std::sync::Arc;

use super::customer::CustomerId;
use crate::errors::{DbError, DbResult};
use crate::observability::Event;
use crate::storage::{RecordNumber, RecordStore};

/// Name of the column holding the booking customer.
pub const OWNER_FIELD: &str = "owner";

/// Returns true if an owner column value means "not booked".
///
/// Blank and any integer equal to zero are available; everything else,
/// including unparseable text, counts as booked.
pub fn is_available(owner: &str) -> bool {
    let owner = owner.trim();
    owner.is_empty() || owner.parse::<i64>() == Ok(0)
}

/// Books and releases records of one store.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<RecordStore>,
    owner_field: usize,
}

impl BookingService {
    /// Creates a service using the store's `owner` column.
    ///
    /// # Errors
    ///
    /// `InvalidHeader` if the schema has no `owner` column.
    pub fn new(store: Arc<RecordStore>) -> DbResult<Self> {
        let owner_field = store
            .catalog()
            .field_index(OWNER_FIELD)
            .ok_or_else(|| DbError::InvalidHeader(format!("missing column '{}'", OWNER_FIELD)))?;
        Ok(Self { store, owner_field })
    }

    /// Creates a service writing the owner into column `owner_field`.
    pub fn for_field(store: Arc<RecordStore>, owner_field: usize) -> DbResult<Self> {
        let field_count = store.catalog().field_count();
        if owner_field >= field_count {
            return Err(DbError::InvalidHeader(format!(
                "owner column {} out of range, schema has {} fields",
                owner_field, field_count
            )));
        }
        Ok(Self { store, owner_field })
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Assigns `record_number` to `customer`.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if the record does not exist or is deleted
    /// - `RecordNotAvailable` if the record already has an owner, the same
    ///   customer included
    /// - `InvalidCustomerId` if the id has more digits than the owner column
    ///   holds
    /// - any persistence error from the update
    pub fn book(&self, record_number: RecordNumber, customer: CustomerId) -> DbResult<()> {
        let owner_value = customer.to_string();
        let width = self.owner_width();
        if owner_value.len() > width {
            let err = DbError::InvalidCustomerId(format!(
                "{} does not fit the {}-character owner column",
                owner_value, width
            ));
            return Err(self.rejected(record_number, err));
        }

        let guard = self
            .store
            .lock_guard(record_number)
            .map_err(|e| self.rejected(record_number, e))?;

        let mut values = self
            .store
            .read(record_number)
            .map_err(|e| self.rejected(record_number, e))?;

        let owner = &values[self.owner_field];
        if !is_available(owner) {
            let err = DbError::RecordNotAvailable {
                record_number,
                owner: owner.clone(),
            };
            return Err(self.rejected(record_number, err));
        }

        values[self.owner_field] = owner_value;
        self.store
            .update(record_number, &values, guard.cookie())
            .map_err(|e| self.rejected(record_number, e))?;
        guard.release()?;

        self.store.metrics().increment_bookings_completed();
        self.store.log(
            Event::BookingComplete,
            &[
                ("customer", &customer.to_string()),
                ("record", &record_number.to_string()),
            ],
        );
        Ok(())
    }

    /// Clears the owner of `record_number`, whoever it is.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if the record does not exist or is deleted
    /// - any persistence error from the update
    pub fn release(&self, record_number: RecordNumber) -> DbResult<()> {
        let guard = self
            .store
            .lock_guard(record_number)
            .map_err(|e| record_not_found(record_number, e))?;

        let mut values = self
            .store
            .read(record_number)
            .map_err(|e| record_not_found(record_number, e))?;
        let previous = std::mem::take(&mut values[self.owner_field]);

        self.store
            .update(record_number, &values, guard.cookie())
            .map_err(|e| record_not_found(record_number, e))?;
        guard.release()?;

        self.store.log(
            Event::BookingReleased,
            &[("previous_owner", &previous), ("record", &record_number.to_string())],
        );
        Ok(())
    }

    fn owner_width(&self) -> usize {
        usize::from(self.store.catalog().fields()[self.owner_field].max_length)
    }

    fn rejected(&self, record_number: RecordNumber, err: DbError) -> DbError {
        let err = record_not_found(record_number, err);
        self.store.metrics().increment_bookings_rejected();
        self.store.log(
            Event::BookingRejected,
            &[("code", err.code()), ("record", &record_number.to_string())],
        );
        err
    }
}

/// Booking callers see a missing record as `RecordNotFound`.
fn record_not_found(record_number: RecordNumber, err: DbError) -> DbError {
    match err {
        DbError::NotFound { .. } => DbError::RecordNotFound { record_number },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::LockState;
    use crate::schema::{FieldDescriptor, SchemaCatalog};
    use crate::errors::Operation;
    use crate::storage::{RecordSink, StoreOptions, StoredRecord};
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Sink that accepts writes until `fail` is set.
    #[derive(Clone, Default)]
    struct SwitchSink {
        fail: Arc<AtomicBool>,
    }

    impl RecordSink for SwitchSink {
        fn write_at(&mut self, _offset: u64, _buf: &[u8]) -> io::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            Ok(())
        }
    }

    fn load_store(owner_width: u16, owners: &[&str], sink: SwitchSink) -> Arc<RecordStore> {
        let catalog = SchemaCatalog::new(vec![
            FieldDescriptor::new("name", 16),
            FieldDescriptor::new("location", 16),
            FieldDescriptor::new("owner", owner_width),
        ]);
        let mut image = catalog.encode().unwrap();
        for (i, owner) in owners.iter().enumerate() {
            let record = StoredRecord::live(vec![format!("Firm {}", i), "Smallville".into(), owner.to_string()]);
            image.extend_from_slice(&record.serialize(&catalog));
        }
        Arc::new(RecordStore::load(Cursor::new(image), Box::new(sink), StoreOptions::default()).unwrap())
    }

    fn store_with(owners: &[&str]) -> Arc<RecordStore> {
        load_store(8, owners, SwitchSink::default())
    }

    fn customer(id: u64) -> CustomerId {
        CustomerId::new(id).unwrap()
    }

    #[test]
    fn test_is_available() {
        assert!(is_available(""));
        assert!(is_available("   "));
        assert!(is_available("0"));
        assert!(is_available("00000000"));
        assert!(!is_available("12345678"));
        assert!(!is_available("someone"));
    }

    #[test]
    fn test_book_sets_owner_and_unlocks() {
        let store = store_with(&[""]);
        let service = BookingService::new(Arc::clone(&store)).unwrap();

        service.book(0, customer(12345678)).unwrap();

        assert_eq!(store.read(0).unwrap()[2], "12345678");
        assert_eq!(store.lock_state(0).unwrap(), LockState::Unlocked);
        assert_eq!(store.metrics().snapshot().bookings_completed, 1);
    }

    #[test]
    fn test_book_is_not_idempotent() {
        let store = store_with(&["0"]);
        let service = BookingService::new(Arc::clone(&store)).unwrap();

        service.book(0, customer(7)).unwrap();
        let err = service.book(0, customer(7)).unwrap_err();

        assert!(matches!(err, DbError::RecordNotAvailable { record_number: 0, ref owner } if owner == "7"));
        assert_eq!(store.lock_state(0).unwrap(), LockState::Unlocked);
        assert_eq!(store.metrics().snapshot().bookings_rejected, 1);
    }

    #[test]
    fn test_book_missing_record() {
        let store = store_with(&[""]);
        let service = BookingService::new(Arc::clone(&store)).unwrap();

        assert!(matches!(
            service.book(9, customer(1)),
            Err(DbError::RecordNotFound { record_number: 9 })
        ));
    }

    #[test]
    fn test_book_deleted_record() {
        let store = store_with(&["", ""]);
        let cookie = store.lock(1).unwrap();
        store.delete(1, cookie).unwrap();
        store.unlock(1, cookie).unwrap();

        let service = BookingService::new(Arc::clone(&store)).unwrap();
        assert!(matches!(
            service.book(1, customer(1)),
            Err(DbError::RecordNotFound { record_number: 1 })
        ));
    }

    #[test]
    fn test_release_clears_owner() {
        let store = store_with(&["4711"]);
        let service = BookingService::new(Arc::clone(&store)).unwrap();

        service.release(0).unwrap();
        assert_eq!(store.read(0).unwrap()[2], "");

        service.book(0, customer(99)).unwrap();
        assert_eq!(store.read(0).unwrap()[2], "99");
    }

    #[test]
    fn test_owner_column_required() {
        let catalog = SchemaCatalog::new(vec![FieldDescriptor::new("name", 4), FieldDescriptor::new("city", 4)]);
        let store = Arc::new(
            RecordStore::load(
                Cursor::new(catalog.encode().unwrap()),
                Box::new(SwitchSink::default()),
                StoreOptions::default(),
            )
            .unwrap(),
        );

        assert!(matches!(
            BookingService::new(Arc::clone(&store)),
            Err(DbError::InvalidHeader(_))
        ));
        assert!(BookingService::for_field(Arc::clone(&store), 1).is_ok());
        assert!(BookingService::for_field(store, 2).is_err());
    }

    #[test]
    fn test_customer_wider_than_owner_column_rejected() {
        let store = load_store(4, &[""], SwitchSink::default());
        let service = BookingService::new(Arc::clone(&store)).unwrap();

        let err = service.book(0, customer(123456)).unwrap_err();
        assert!(matches!(err, DbError::InvalidCustomerId(_)));
        assert_eq!(store.read(0).unwrap()[2], "");
        assert_eq!(store.lock_state(0).unwrap(), LockState::Unlocked);
        assert_eq!(store.metrics().snapshot().bookings_rejected, 1);

        service.book(0, customer(1234)).unwrap();
        assert_eq!(store.read(0).unwrap()[2], "1234");
    }

    #[test]
    fn test_failed_update_releases_lock() {
        let sink = SwitchSink::default();
        let store = load_store(8, &[""], sink.clone());
        let service = BookingService::new(Arc::clone(&store)).unwrap();
        sink.fail.store(true, Ordering::SeqCst);

        let err = service.book(0, customer(42)).unwrap_err();
        assert!(matches!(
            err,
            DbError::IoFailure {
                operation: Operation::Update,
                ..
            }
        ));
        assert_eq!(store.lock_state(0).unwrap(), LockState::Unlocked);
        assert_eq!(store.read(0).unwrap()[2], "");

        sink.fail.store(false, Ordering::SeqCst);
        service.book(0, customer(42)).unwrap();
        assert_eq!(store.read(0).unwrap()[2], "42");
    }
}
