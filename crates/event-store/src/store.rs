use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventRecord, Result};

/// A stream of event records in global creation order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventRecord>> + Send>>;

/// Core trait for event store implementations.
///
/// The store is append-only; records are never updated or deleted. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Raises a domain event: inserts the record iff no event with the same
    /// `(subject_id, event_name)` key exists.
    ///
    /// Fails with [`crate::EventStoreError::DuplicateEvent`] when the key is
    /// already present, and with [`crate::EventStoreError::InvalidRecord`]
    /// (before any I/O) when the record is malformed.
    async fn raise(&self, record: EventRecord) -> Result<()>;

    /// Retrieves a single event by its storage key.
    ///
    /// Returns None if the event has not been raised.
    async fn get_event(&self, subject_id: &str, event_name: &str) -> Result<Option<EventRecord>>;

    /// Retrieves all events for a subject, oldest first.
    async fn events_for_subject(&self, subject_id: &str) -> Result<Vec<EventRecord>>;

    /// Streams every event in the store ordered globally by creation time.
    ///
    /// This is the access path external replay tooling consumes; the
    /// lifecycle workers themselves never read it.
    async fn stream_all(&self) -> Result<EventStream>;
}

/// Validates a record before it is written.
///
/// Runs ahead of any I/O so malformed input never reaches the backend.
pub fn validate_record(record: &EventRecord) -> std::result::Result<(), String> {
    if record.subject_id.trim().is_empty() {
        return Err("subject_id must not be empty".to_string());
    }
    if record.event_name.trim().is_empty() {
        return Err("event_name must not be empty".to_string());
    }
    if record.payload.is_null() {
        return Err("payload must not be null".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(subject: &str, name: &str, payload: serde_json::Value) -> EventRecord {
        EventRecord {
            subject_id: subject.to_string(),
            event_name: name.to_string(),
            payload,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn accepts_well_formed_records() {
        let r = record("order-1", "ORDER_PAYMENT_ACCEPTED", serde_json::json!({}));
        assert!(validate_record(&r).is_ok());
    }

    #[test]
    fn rejects_empty_subject() {
        let r = record("  ", "ORDER_PAYMENT_ACCEPTED", serde_json::json!({}));
        assert!(validate_record(&r).is_err());
    }

    #[test]
    fn rejects_empty_event_name() {
        let r = record("order-1", "", serde_json::json!({}));
        assert!(validate_record(&r).is_err());
    }

    #[test]
    fn rejects_null_payload() {
        let r = record("order-1", "ORDER_PAYMENT_ACCEPTED", serde_json::Value::Null);
        assert!(validate_record(&r).is_err());
    }
}
