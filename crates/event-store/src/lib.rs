//! Append-only store of domain events.
//!
//! Every terminal outcome in the order lifecycle is recorded here exactly
//! once. The write path is a conditional insert keyed by
//! `(subject_id, event_name)`: raising the same logical event twice fails
//! with [`EventStoreError::DuplicateEvent`], which callers treat as
//! "already done" rather than as a fault. That single property is what makes
//! redelivered messages safe to replay.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{EventStoreError, Result};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use record::{EventRecord, EventRecordBuilder};
pub use store::{EventStore, EventStream};
