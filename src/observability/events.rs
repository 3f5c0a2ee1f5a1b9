//! Observable events for flatdb
//!
//! Events are explicit and typed; each maps to one stable upper-case name that
//! appears as the `event` key of a log line.

use std::fmt;

/// Observable events in flatdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Store lifecycle
    /// Data file open begins
    StoreOpenBegin,
    /// Header parsed and all slots loaded
    StoreOpened,
    /// Data file could not be opened (FATAL)
    StoreOpenFailed,
    /// Configuration loaded
    ConfigLoaded,
    /// New data file written
    StoreInitialized,

    // Record mutations
    /// Record created (appended or recycled slot)
    RecordCreated,
    /// Record updated
    RecordUpdated,
    /// Record soft-deleted
    RecordDeleted,
    /// A write to the data file failed
    PersistenceFailed,

    // Locking
    /// Lock granted
    RecordLocked,
    /// Lock released
    RecordUnlocked,

    // Booking
    /// Booking committed
    BookingComplete,
    /// Booking refused
    BookingRejected,
    /// Booking cleared
    BookingReleased,

    // Command sessions
    /// JSON session started
    SessionBegin,
    /// JSON session ended
    SessionEnd,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreOpenBegin => "STORE_OPEN_BEGIN",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreOpenFailed => "STORE_OPEN_FAILED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreInitialized => "STORE_INITIALIZED",

            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::PersistenceFailed => "PERSISTENCE_FAILED",

            Event::RecordLocked => "RECORD_LOCKED",
            Event::RecordUnlocked => "RECORD_UNLOCKED",

            Event::BookingComplete => "BOOKING_COMPLETE",
            Event::BookingRejected => "BOOKING_REJECTED",
            Event::BookingReleased => "BOOKING_RELEASED",

            Event::SessionBegin => "SESSION_BEGIN",
            Event::SessionEnd => "SESSION_END",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreOpenFailed)
    }

    /// Returns true if this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::StoreOpenFailed | Event::PersistenceFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::StoreOpenBegin,
            Event::StoreOpened,
            Event::StoreOpenFailed,
            Event::ConfigLoaded,
            Event::StoreInitialized,
            Event::RecordCreated,
            Event::RecordUpdated,
            Event::RecordDeleted,
            Event::PersistenceFailed,
            Event::RecordLocked,
            Event::RecordUnlocked,
            Event::BookingComplete,
            Event::BookingRejected,
            Event::BookingReleased,
            Event::SessionBegin,
            Event::SessionEnd,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::StoreOpenFailed.is_fatal());
        assert!(!Event::PersistenceFailed.is_fatal());
        assert!(Event::PersistenceFailed.is_failure());
        assert!(!Event::BookingRejected.is_failure());
    }
}
