//! Domain error types.

use thiserror::Error;

use crate::payment::OrderPaymentData;

/// Error returned when inbound order fields fail validation.
///
/// Carries the first predicate rule that failed. Always non-transient:
/// redelivering the same malformed input can never succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {rule}")]
pub struct ValidationError {
    pub rule: &'static str,
}

/// Errors that can occur when reading or writing payment records.
#[derive(Debug, Error)]
pub enum PaymentStoreError {
    /// The write precondition failed and the stored record is already
    /// accepted. A concurrent invocation finalized the payment first;
    /// the stored record is carried so callers can adopt it.
    #[error("payment already accepted for order {}", .0.order_id)]
    AlreadyAccepted(Box<OrderPaymentData>),

    /// The write precondition failed and the stored record is already
    /// rejected.
    #[error("payment already rejected for order {}", .0.order_id)]
    AlreadyRejected(Box<OrderPaymentData>),

    /// The write precondition failed without terminal evidence; another
    /// worker moved the record to a different non-terminal state.
    #[error("conflicting concurrent write for order {order_id}")]
    Conflict { order_id: String },

    /// A stored row could not be mapped back into a payment record.
    #[error("corrupt payment record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PaymentStoreError {
    /// Returns true if retrying the write later could succeed.
    ///
    /// Terminal-state races never clear on retry; everything else is
    /// treated as an infrastructure fault.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            PaymentStoreError::AlreadyAccepted(_) | PaymentStoreError::AlreadyRejected(_)
        )
    }
}
