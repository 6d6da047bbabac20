use async_trait::async_trait;
use common::OrderId;

use crate::error::PaymentStoreError;

use super::OrderPaymentData;

/// Store of durable payment records, one per order.
///
/// The writer is the system's optimistic-concurrency anchor: every write
/// carries the previously-read state as a precondition, so two workers
/// racing on the same order cannot both finalize it. All implementations
/// must be thread-safe (Send + Sync).
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Fetches the current payment record for an order, if any.
    async fn load(&self, order_id: &OrderId) -> Result<Option<OrderPaymentData>, PaymentStoreError>;

    /// Transactionally replaces the payment record.
    ///
    /// The precondition is the exact previously-read state: absence when
    /// `existing` is None, otherwise the stored `(payment_status,
    /// payment_retries)` pair must still match. On precondition failure the
    /// error reports what is actually stored —
    /// [`PaymentStoreError::AlreadyAccepted`] /
    /// [`PaymentStoreError::AlreadyRejected`] when a concurrent worker
    /// finalized first (carrying the stored record), or
    /// [`PaymentStoreError::Conflict`] otherwise.
    ///
    /// Returns the stored record on success.
    async fn record(
        &self,
        existing: Option<&OrderPaymentData>,
        updated: OrderPaymentData,
    ) -> Result<OrderPaymentData, PaymentStoreError>;
}
