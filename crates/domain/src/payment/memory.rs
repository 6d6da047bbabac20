use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::PaymentStoreError;

use super::{OrderPaymentData, PaymentStatus, PaymentStore};

/// In-memory payment record store.
///
/// Mirrors the conditional-write semantics of the PostgreSQL
/// implementation. Used in tests and in the default worker wiring.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<String, OrderPaymentData>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of payment records held.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Inserts a record directly, bypassing the precondition. Test setup
    /// helper for seeding pre-existing state.
    pub async fn seed(&self, record: OrderPaymentData) {
        self.records
            .write()
            .await
            .insert(record.order_id.as_str().to_string(), record);
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn load(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<OrderPaymentData>, PaymentStoreError> {
        Ok(self.records.read().await.get(order_id.as_str()).cloned())
    }

    async fn record(
        &self,
        existing: Option<&OrderPaymentData>,
        updated: OrderPaymentData,
    ) -> Result<OrderPaymentData, PaymentStoreError> {
        let key = updated.order_id.as_str().to_string();
        let mut records = self.records.write().await;
        let stored = records.get(&key);

        let precondition_holds = match (existing, stored) {
            (None, None) => true,
            (Some(prev), Some(cur)) => {
                cur.payment_status == prev.payment_status
                    && cur.payment_retries == prev.payment_retries
            }
            _ => false,
        };

        if precondition_holds {
            tracing::debug!(
                order_id = %updated.order_id,
                status = %updated.payment_status,
                retries = updated.payment_retries,
                "payment record written"
            );
            records.insert(key, updated.clone());
            return Ok(updated);
        }

        metrics::counter!("payment_store_conflicts_total").increment(1);
        match stored {
            Some(cur) if cur.payment_status == PaymentStatus::Accepted => {
                Err(PaymentStoreError::AlreadyAccepted(Box::new(cur.clone())))
            }
            Some(cur) if cur.payment_status == PaymentStatus::Rejected => {
                Err(PaymentStoreError::AlreadyRejected(Box::new(cur.clone())))
            }
            _ => Err(PaymentStoreError::Conflict { order_id: key }),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::payment::OrderFields;

    use super::*;

    fn details() -> crate::payment::OrderDetails {
        OrderFields {
            order_id: "mockOrderId".to_string(),
            sku: "SKU-001".to_string(),
            units: 2,
            price: 19.99,
            user_id: "user-42".to_string(),
        }
        .validate()
        .unwrap()
    }

    fn ts(minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn create_requires_absence() {
        let store = InMemoryPaymentStore::new();
        let d = details();
        let record = OrderPaymentData::accepted(&d, "p1".to_string(), None, ts(0));

        let stored = store.record(None, record.clone()).await.unwrap();
        assert_eq!(stored, record);
        assert_eq!(store.record_count().await, 1);

        // A second unconditional create races against the stored terminal
        // state and reports it.
        let err = store
            .record(None, OrderPaymentData::rejected(&d, None, None, ts(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentStoreError::AlreadyAccepted(_)));
    }

    #[tokio::test]
    async fn update_requires_exact_previous_state() {
        let store = InMemoryPaymentStore::new();
        let d = details();
        let failed = OrderPaymentData::failed(&d, None, ts(0));
        store.seed(failed.clone()).await;

        let accepted =
            OrderPaymentData::accepted(&d, "p1".to_string(), Some(&failed), ts(1));
        let stored = store.record(Some(&failed), accepted).await.unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Accepted);
    }

    #[tokio::test]
    async fn stale_retry_count_is_a_conflict() {
        let store = InMemoryPaymentStore::new();
        let d = details();
        let failed_once = OrderPaymentData::failed(&d, None, ts(0));
        let failed_twice = OrderPaymentData::failed(&d, Some(&failed_once), ts(1));
        store.seed(failed_twice).await;

        // Writer observed retries=1 but the store has moved to retries=2.
        let err = store
            .record(
                Some(&failed_once),
                OrderPaymentData::accepted(&d, "p1".to_string(), Some(&failed_once), ts(2)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentStoreError::Conflict { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn race_against_rejected_reports_stored_record() {
        let store = InMemoryPaymentStore::new();
        let d = details();
        let failed = OrderPaymentData::failed(&d, None, ts(0));
        let rejected = OrderPaymentData::rejected(&d, None, Some(&failed), ts(1));
        store.seed(rejected.clone()).await;

        let err = store
            .record(
                Some(&failed),
                OrderPaymentData::accepted(&d, "p1".to_string(), Some(&failed), ts(2)),
            )
            .await
            .unwrap_err();

        match err {
            PaymentStoreError::AlreadyRejected(stored) => {
                assert_eq!(*stored, rejected);
                assert!(!PaymentStoreError::AlreadyRejected(stored).is_transient());
            }
            other => panic!("expected AlreadyRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_missing_record_is_none() {
        let store = InMemoryPaymentStore::new();
        let d = details();
        assert!(store.load(&d.order_id).await.unwrap().is_none());
    }
}
