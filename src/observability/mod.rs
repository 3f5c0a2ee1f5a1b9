//! Observability subsystem for flatdb
//!
//! - Structured logging (JSON lines)
//! - Counter metrics per open store
//! - Typed lifecycle events
//!
//! Observability is read-only: it never changes the outcome of the operation
//! it reports on.
//!
//! # Usage
//!
//! ```ignore
//! use flatdb::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::event(Event::RecordLocked, &[("record", "4")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_bookings_completed();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
