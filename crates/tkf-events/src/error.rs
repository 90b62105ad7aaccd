//! Error types for the event log

use tkf_core::EventId;

/// Event log errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventLogError {
    /// Log reached its fixed capacity
    #[error("event store is full (max={max}); cannot add more events")]
    StoreFull {
        /// Configured capacity
        max: usize,
    },

    /// An event with this id is already stored
    #[error("duplicate event id: {0}")]
    DuplicateId(EventId),
}

impl EventLogError {
    /// Check if this is a capacity failure
    #[inline]
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::StoreFull { .. })
    }
}
