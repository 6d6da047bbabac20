use async_trait::async_trait;
use common::OrderId;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::PaymentStoreError;

use super::{OrderPaymentData, PaymentStatus, PaymentStore};

/// PostgreSQL-backed payment record store.
///
/// Creates are `INSERT ... ON CONFLICT DO NOTHING`; updates carry the
/// previously-read `(payment_status, payment_retries)` pair in the WHERE
/// clause. Zero affected rows means the precondition failed, and the
/// current row is re-read to classify the race.
#[derive(Clone)]
pub struct PostgresPaymentStore {
    pool: PgPool,
}

impl PostgresPaymentStore {
    /// Creates a new PostgreSQL payment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_record(row: PgRow) -> Result<OrderPaymentData, PaymentStoreError> {
        let order_id: String = row.try_get("order_id")?;
        let order_id = OrderId::new(order_id)
            .map_err(|e| PaymentStoreError::Corrupt(format!("stored order id: {e}")))?;

        let status: String = row.try_get("payment_status")?;
        let payment_status: PaymentStatus =
            status.parse().map_err(PaymentStoreError::Corrupt)?;

        let units: i64 = row.try_get("units")?;
        let units = u32::try_from(units)
            .map_err(|_| PaymentStoreError::Corrupt(format!("stored units: {units}")))?;

        let retries: i32 = row.try_get("payment_retries")?;
        let payment_retries = u32::try_from(retries)
            .map_err(|_| PaymentStoreError::Corrupt(format!("stored retries: {retries}")))?;

        Ok(OrderPaymentData {
            order_id,
            sku: row.try_get("sku")?,
            units,
            price: row.try_get("price")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            payment_id: row.try_get("payment_id")?,
            payment_status,
            payment_retries,
        })
    }

    async fn fetch(&self, order_id: &str) -> Result<Option<OrderPaymentData>, PaymentStoreError> {
        let row = sqlx::query(
            r#"
            SELECT order_id, sku, units, price, user_id, payment_id,
                   payment_status, payment_retries, created_at, updated_at
            FROM order_payments
            WHERE order_id = $1 AND record_type = $2
            "#,
        )
        .bind(order_id)
        .bind(OrderPaymentData::RECORD_TYPE)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    /// Re-reads the stored row after a failed precondition and reports the
    /// race it evidences.
    async fn classify_conflict(&self, order_id: &str) -> PaymentStoreError {
        metrics::counter!("payment_store_conflicts_total").increment(1);
        match self.fetch(order_id).await {
            Ok(Some(cur)) if cur.payment_status == PaymentStatus::Accepted => {
                PaymentStoreError::AlreadyAccepted(Box::new(cur))
            }
            Ok(Some(cur)) if cur.payment_status == PaymentStatus::Rejected => {
                PaymentStoreError::AlreadyRejected(Box::new(cur))
            }
            Ok(_) => PaymentStoreError::Conflict {
                order_id: order_id.to_string(),
            },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl PaymentStore for PostgresPaymentStore {
    async fn load(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<OrderPaymentData>, PaymentStoreError> {
        self.fetch(order_id.as_str()).await
    }

    async fn record(
        &self,
        existing: Option<&OrderPaymentData>,
        updated: OrderPaymentData,
    ) -> Result<OrderPaymentData, PaymentStoreError> {
        let result = match existing {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO order_payments
                        (order_id, record_type, sku, units, price, user_id,
                         payment_id, payment_status, payment_retries, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    ON CONFLICT (order_id, record_type) DO NOTHING
                    "#,
                )
                .bind(updated.order_id.as_str())
                .bind(OrderPaymentData::RECORD_TYPE)
                .bind(&updated.sku)
                .bind(i64::from(updated.units))
                .bind(updated.price)
                .bind(&updated.user_id)
                .bind(&updated.payment_id)
                .bind(updated.payment_status.as_str())
                .bind(i32::try_from(updated.payment_retries).unwrap_or(i32::MAX))
                .bind(updated.created_at)
                .bind(updated.updated_at)
                .execute(&self.pool)
                .await?
            }
            Some(prev) => {
                sqlx::query(
                    r#"
                    UPDATE order_payments
                    SET sku = $1, units = $2, price = $3, user_id = $4,
                        payment_id = $5, payment_status = $6, payment_retries = $7,
                        updated_at = $8
                    WHERE order_id = $9 AND record_type = $10
                      AND payment_status = $11 AND payment_retries = $12
                    "#,
                )
                .bind(&updated.sku)
                .bind(i64::from(updated.units))
                .bind(updated.price)
                .bind(&updated.user_id)
                .bind(&updated.payment_id)
                .bind(updated.payment_status.as_str())
                .bind(i32::try_from(updated.payment_retries).unwrap_or(i32::MAX))
                .bind(updated.updated_at)
                .bind(updated.order_id.as_str())
                .bind(OrderPaymentData::RECORD_TYPE)
                .bind(prev.payment_status.as_str())
                .bind(i32::try_from(prev.payment_retries).unwrap_or(i32::MAX))
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(self.classify_conflict(updated.order_id.as_str()).await);
        }

        tracing::debug!(
            order_id = %updated.order_id,
            status = %updated.payment_status,
            retries = updated.payment_retries,
            "payment record written"
        );
        Ok(updated)
    }
}
