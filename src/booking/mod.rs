//! Booking on top of the record store
//!
//! - [`BookingService`]: the lock, read, check, write, unlock transaction
//! - [`ContractorCommands`]: typed `find` and `book` over contractor rows
//! - [`CustomerId`]: validated booking owner

mod commands;
mod contractor;
mod customer;
mod service;

pub use commands::{BookingRequest, ContractorCommands};
pub use contractor::{Contractor, ContractorColumns};
pub use customer::CustomerId;
pub use service::{is_available, BookingService, OWNER_FIELD};
