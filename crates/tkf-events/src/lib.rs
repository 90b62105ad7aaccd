//! TKF Events - interaction event log
//!
//! Append-only store of [`InteractionEvent`]s with secondary indices by
//! group, persona and session. Capacity is bounded and overflow is a hard
//! failure: nothing is ever evicted.
//!
//! [`InteractionEvent`]: tkf_core::InteractionEvent

#![warn(unreachable_pub)]

mod error;
mod store;

pub use error::EventLogError;
pub use store::{EventLogConfig, EventRepository, InMemoryEventLog, DEFAULT_MAX_EVENTS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
