use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored domain event.
///
/// The `(subject_id, event_name)` pair is the storage key: one logical event
/// per subject, ever. `payload` carries the event data exactly as it was
/// published, so external replay tooling can re-deliver it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// The subject (order) this event belongs to.
    pub subject_id: String,

    /// Discriminated event identifier (e.g. "ORDER_PAYMENT_ACCEPTED").
    pub event_name: String,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// When the event was created.
    pub created_at: DateTime<Utc>,

    /// When the event record was last written.
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    /// Creates a new event record builder.
    pub fn builder() -> EventRecordBuilder {
        EventRecordBuilder::default()
    }
}

/// Builder for constructing event records.
#[derive(Debug, Default)]
pub struct EventRecordBuilder {
    subject_id: Option<String>,
    event_name: Option<String>,
    payload: Option<serde_json::Value>,
    recorded_at: Option<DateTime<Utc>>,
}

impl EventRecordBuilder {
    /// Sets the subject id.
    pub fn subject_id(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    /// Sets the event name.
    pub fn event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = Some(name.into());
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets both timestamps to the given instant.
    ///
    /// Timestamps are always supplied by the caller's clock capability;
    /// the builder never samples the wall clock itself.
    pub fn recorded_at(mut self, instant: DateTime<Utc>) -> Self {
        self.recorded_at = Some(instant);
        self
    }

    /// Builds the event record.
    ///
    /// # Panics
    ///
    /// Panics if required fields (subject_id, event_name, payload,
    /// recorded_at) are not set.
    pub fn build(self) -> EventRecord {
        self.try_build().expect("missing required field")
    }

    /// Tries to build the event record, returning None if required fields
    /// are missing.
    pub fn try_build(self) -> Option<EventRecord> {
        let recorded_at = self.recorded_at?;
        Some(EventRecord {
            subject_id: self.subject_id?,
            event_name: self.event_name?,
            payload: self.payload?,
            created_at: recorded_at,
            updated_at: recorded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn builder_sets_both_timestamps() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let record = EventRecord::builder()
            .subject_id("order-1")
            .event_name("ORDER_PAYMENT_ACCEPTED")
            .payload_raw(serde_json::json!({"orderId": "order-1"}))
            .recorded_at(instant)
            .build();

        assert_eq!(record.created_at, instant);
        assert_eq!(record.updated_at, instant);
        assert_eq!(record.event_name, "ORDER_PAYMENT_ACCEPTED");
    }

    #[test]
    fn builder_serializes_typed_payloads() {
        #[derive(Serialize)]
        struct Payload {
            amount: u32,
        }

        let record = EventRecord::builder()
            .subject_id("order-1")
            .event_name("ORDER_PAYMENT_REJECTED")
            .payload(&Payload { amount: 3 })
            .unwrap()
            .recorded_at(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap())
            .build();

        assert_eq!(record.payload, serde_json::json!({"amount": 3}));
    }

    #[test]
    fn try_build_returns_none_on_missing_fields() {
        assert!(EventRecord::builder().try_build().is_none());
    }
}
