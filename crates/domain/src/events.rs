//! The closed vocabulary of order lifecycle events and the wire envelope.

use chrono::{DateTime, Utc};
use event_store::EventRecord;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Error returned when an event name is not part of the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event name: {0}")]
pub struct UnknownEventName(pub String);

/// Discriminated identifiers for the order lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventName {
    /// A customer placed an order; triggers stock allocation.
    #[serde(rename = "ORDER_CREATED")]
    OrderCreated,

    /// Stock was allocated; triggers the payment saga.
    #[serde(rename = "ORDER_STOCK_ALLOCATED")]
    StockAllocated,

    /// Terminal payment outcome: accepted.
    #[serde(rename = "ORDER_PAYMENT_ACCEPTED")]
    PaymentAccepted,

    /// Terminal payment outcome: rejected.
    #[serde(rename = "ORDER_PAYMENT_REJECTED")]
    PaymentRejected,
}

impl OrderEventName {
    /// Returns the wire-level event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventName::OrderCreated => "ORDER_CREATED",
            OrderEventName::StockAllocated => "ORDER_STOCK_ALLOCATED",
            OrderEventName::PaymentAccepted => "ORDER_PAYMENT_ACCEPTED",
            OrderEventName::PaymentRejected => "ORDER_PAYMENT_REJECTED",
        }
    }
}

impl std::fmt::Display for OrderEventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderEventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER_CREATED" => Ok(OrderEventName::OrderCreated),
            "ORDER_STOCK_ALLOCATED" => Ok(OrderEventName::StockAllocated),
            "ORDER_PAYMENT_ACCEPTED" => Ok(OrderEventName::PaymentAccepted),
            "ORDER_PAYMENT_REJECTED" => Ok(OrderEventName::PaymentRejected),
            other => Err(UnknownEventName(other.to_string())),
        }
    }
}

/// Domain event envelope as published and consumed on the wire.
///
/// Deserialization is strict about `eventName`: a name outside the
/// vocabulary fails to parse, which downstream classifies as a poison
/// message rather than something retryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_name: OrderEventName,
    pub event_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Creates an envelope from a typed payload, timestamping it with the
    /// caller's clock reading.
    pub fn new<T: Serialize>(
        event_name: OrderEventName,
        event_data: &T,
        now: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_name,
            event_data: serde_json::to_value(event_data)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Deserializes the payload into a typed value.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.event_data.clone())
    }

    /// Converts the envelope into a storable event record for the given
    /// subject, preserving the envelope timestamps.
    pub fn into_record(self, subject_id: &str) -> EventRecord {
        EventRecord {
            subject_id: subject_id.to_string(),
            event_name: self.event_name.as_str().to_string(),
            payload: self.event_data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn event_names_roundtrip_through_strings() {
        for name in [
            OrderEventName::OrderCreated,
            OrderEventName::StockAllocated,
            OrderEventName::PaymentAccepted,
            OrderEventName::PaymentRejected,
        ] {
            assert_eq!(name.as_str().parse::<OrderEventName>().unwrap(), name);
        }
        assert!("ORDER_SHIPPED".parse::<OrderEventName>().is_err());
    }

    #[test]
    fn envelope_uses_camel_case_wire_names() {
        let envelope = EventEnvelope::new(
            OrderEventName::StockAllocated,
            &serde_json::json!({"orderId": "mockOrderId"}),
            now(),
        )
        .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["eventName"], "ORDER_STOCK_ALLOCATED");
        assert_eq!(json["eventData"]["orderId"], "mockOrderId");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn envelope_rejects_unknown_event_names() {
        let raw = serde_json::json!({
            "eventName": "ORDER_SHIPPED",
            "eventData": {},
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
        });
        assert!(serde_json::from_value::<EventEnvelope>(raw).is_err());
    }

    #[test]
    fn into_record_preserves_timestamps_and_payload() {
        let envelope = EventEnvelope::new(
            OrderEventName::PaymentAccepted,
            &serde_json::json!({"orderId": "mockOrderId"}),
            now(),
        )
        .unwrap();

        let record = envelope.clone().into_record("mockOrderId");
        assert_eq!(record.subject_id, "mockOrderId");
        assert_eq!(record.event_name, "ORDER_PAYMENT_ACCEPTED");
        assert_eq!(record.created_at, now());
        assert_eq!(record.payload, envelope.event_data);
    }
}
