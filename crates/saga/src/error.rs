//! Saga error taxonomy.
//!
//! Every saga failure carries one primary kind plus a transient flag. The
//! batch controller inspects only the flag; the kinds exist for logging and
//! for the few call sites that absorb specific failures (duplicate raises,
//! terminal-state races).

use event_store::EventStoreError;
use thiserror::Error;

use domain::ValidationError;

/// Errors that can surface from a saga invocation.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Malformed input: wrong event type, unparseable payload, or fields
    /// that fail validation. Non-transient; the message is dropped.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The terminal event was already recorded for this order.
    /// Non-transient; callers that raise idempotently absorb it.
    #[error("event {event_name} already raised for subject {subject_id}")]
    DuplicateEventRaised {
        subject_id: String,
        event_name: String,
    },

    /// The gateway declined the payment attempt. Transient; the message is
    /// redelivered until the retry cap forces rejection.
    #[error("payment attempt failed for order {order_id} ({retries} attempts recorded)")]
    PaymentFailed { order_id: String, retries: u32 },

    /// An unexpected store or gateway fault. Transient; always retried.
    #[error("unrecognized error: {0}")]
    Unrecognized(String),
}

impl SagaError {
    /// Returns the wire-level kind name for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            SagaError::InvalidArguments(_) => "InvalidArgumentsError",
            SagaError::DuplicateEventRaised { .. } => "DuplicateEventRaisedError",
            SagaError::PaymentFailed { .. } => "PaymentFailedError",
            SagaError::Unrecognized(_) => "UnrecognizedError",
        }
    }

    /// Returns true if redelivering the triggering message could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SagaError::PaymentFailed { .. } | SagaError::Unrecognized(_)
        )
    }
}

impl From<ValidationError> for SagaError {
    fn from(e: ValidationError) -> Self {
        SagaError::InvalidArguments(e.to_string())
    }
}

impl From<EventStoreError> for SagaError {
    fn from(e: EventStoreError) -> Self {
        match e {
            EventStoreError::DuplicateEvent {
                subject_id,
                event_name,
            } => SagaError::DuplicateEventRaised {
                subject_id,
                event_name,
            },
            EventStoreError::InvalidRecord(msg) => SagaError::InvalidArguments(msg),
            other => SagaError::Unrecognized(other.to_string()),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
