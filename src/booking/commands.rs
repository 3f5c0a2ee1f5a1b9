//! The contractor command interface: `find` and `book`

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::contractor::{Contractor, ContractorColumns};
use super::customer::CustomerId;
use super::service::BookingService;
use crate::errors::DbResult;
use crate::storage::{RecordNumber, RecordStore};

/// A request to book one contractor for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub record_number: RecordNumber,
    pub customer_id: CustomerId,
}

/// Contractor search and booking over one store.
#[derive(Clone)]
pub struct ContractorCommands {
    store: Arc<RecordStore>,
    columns: ContractorColumns,
    booking: BookingService,
}

impl ContractorCommands {
    /// # Errors
    ///
    /// `InvalidHeader` if the schema lacks a contractor column.
    pub fn new(store: Arc<RecordStore>) -> DbResult<Self> {
        let columns = ContractorColumns::discover(store.catalog())?;
        let booking = BookingService::for_field(Arc::clone(&store), columns.owner)?;
        Ok(Self {
            store,
            columns,
            booking,
        })
    }

    pub fn columns(&self) -> ContractorColumns {
        self.columns
    }

    pub fn booking(&self) -> &BookingService {
        &self.booking
    }

    /// Contractors whose name and location start with the given prefixes.
    ///
    /// Records deleted between the search and the read are skipped.
    pub fn find(&self, name: Option<&str>, location: Option<&str>) -> Vec<Contractor> {
        let criteria = self
            .columns
            .criteria(self.store.catalog().field_count(), name, location);

        self.store
            .find(&criteria)
            .into_iter()
            .filter_map(|n| {
                // deleted since the search
                let values = self.store.read(n).ok()?;
                Some(self.columns.to_contractor(n, &values))
            })
            .collect()
    }

    /// Books a contractor.
    ///
    /// # Errors
    ///
    /// `RecordNotFound`, `RecordNotAvailable`, or a persistence failure.
    pub fn book(&self, request: &BookingRequest) -> DbResult<()> {
        self.booking.book(request.record_number, request.customer_id)
    }
}
