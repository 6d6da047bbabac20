//! The durable payment record and its validated construction.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::PaymentStatus;

/// Unvalidated order fields as they arrive on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFields {
    pub order_id: String,
    pub sku: String,
    pub units: i64,
    pub price: f64,
    pub user_id: String,
}

/// One validation rule: the message reported on failure and the predicate
/// that must hold.
type Rule = (&'static str, fn(&OrderFields) -> bool);

/// The full predicate table applied to inbound order fields, in order.
/// The first failing rule is reported.
const RULES: &[Rule] = &[
    ("orderId must be at least 4 characters", |f| {
        f.order_id.trim().len() >= OrderId::MIN_LEN
    }),
    ("sku must not be empty", |f| !f.sku.trim().is_empty()),
    ("units must be a positive integer", |f| {
        f.units >= 1 && u32::try_from(f.units).is_ok()
    }),
    ("price must be a non-negative finite number", |f| {
        f.price.is_finite() && f.price >= 0.0
    }),
    ("userId must not be empty", |f| !f.user_id.trim().is_empty()),
];

impl OrderFields {
    /// Validates the fields against the predicate table and produces the
    /// typed order details.
    pub fn validate(self) -> Result<OrderDetails, ValidationError> {
        for (rule, holds) in RULES {
            if !holds(&self) {
                return Err(ValidationError { rule });
            }
        }

        let order_id = OrderId::new(self.order_id).map_err(|_| ValidationError {
            rule: "orderId must be at least 4 characters",
        })?;

        Ok(OrderDetails {
            order_id,
            sku: self.sku,
            // The predicate table guarantees the conversion.
            units: self.units as u32,
            price: self.price,
            user_id: self.user_id,
        })
    }
}

/// Validated order details; the input to every payment decision.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order_id: OrderId,
    pub sku: String,
    pub units: u32,
    pub price: f64,
    pub user_id: String,
}

impl OrderDetails {
    /// Re-serializes the details into their wire shape.
    pub fn to_fields(&self) -> OrderFields {
        OrderFields {
            order_id: self.order_id.as_str().to_string(),
            sku: self.sku.clone(),
            units: i64::from(self.units),
            price: self.price,
            user_id: self.user_id.clone(),
        }
    }
}

/// The durable payment record for one order.
///
/// Created on the first successful record write and mutated on every
/// orchestration pass that reaches a new status. Once `payment_status` is
/// terminal the record is never rewritten by this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaymentData {
    pub order_id: OrderId,
    pub sku: String,
    pub units: u32,
    pub price: f64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_retries: u32,
}

impl OrderPaymentData {
    /// Sort/type discriminator grouping payment rows with other records of
    /// the same subject for external range queries.
    pub const RECORD_TYPE: &'static str = "PAYMENT";

    /// Builds the record for an accepted payment.
    ///
    /// Retries are carried over unchanged from the previous record.
    pub fn accepted(
        details: &OrderDetails,
        payment_id: String,
        previous: Option<&OrderPaymentData>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::from_details(
            details,
            PaymentStatus::Accepted,
            Some(payment_id),
            previous.map_or(0, |p| p.payment_retries),
            previous,
            now,
        )
    }

    /// Builds the record for a payment the gateway rejected.
    pub fn rejected(
        details: &OrderDetails,
        payment_id: Option<String>,
        previous: Option<&OrderPaymentData>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::from_details(
            details,
            PaymentStatus::Rejected,
            payment_id,
            previous.map_or(0, |p| p.payment_retries),
            previous,
            now,
        )
    }

    /// Builds the record for a failed gateway attempt, bumping the retry
    /// counter (1 when there was no previous record).
    pub fn failed(
        details: &OrderDetails,
        previous: Option<&OrderPaymentData>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::from_details(
            details,
            PaymentStatus::Failed,
            previous.and_then(|p| p.payment_id.clone()),
            previous.map_or(1, |p| p.payment_retries + 1),
            previous,
            now,
        )
    }

    /// Rewrites a retry-capped record straight to rejected without a
    /// gateway call, keeping the existing payment id and retry count.
    pub fn force_rejected(previous: &OrderPaymentData, now: DateTime<Utc>) -> Self {
        Self {
            payment_status: PaymentStatus::Rejected,
            updated_at: now,
            ..previous.clone()
        }
    }

    /// Returns true if the payment has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.payment_status.is_terminal()
    }

    fn from_details(
        details: &OrderDetails,
        payment_status: PaymentStatus,
        payment_id: Option<String>,
        payment_retries: u32,
        previous: Option<&OrderPaymentData>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: details.order_id.clone(),
            sku: details.sku.clone(),
            units: details.units,
            price: details.price,
            user_id: details.user_id.clone(),
            created_at: previous.map_or(now, |p| p.created_at),
            updated_at: now,
            payment_id,
            payment_status,
            payment_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fields() -> OrderFields {
        OrderFields {
            order_id: "mockOrderId".to_string(),
            sku: "SKU-001".to_string(),
            units: 2,
            price: 19.99,
            user_id: "user-42".to_string(),
        }
    }

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap()
    }

    #[test]
    fn validate_accepts_well_formed_fields() {
        let details = fields().validate().unwrap();
        assert_eq!(details.order_id.as_str(), "mockOrderId");
        assert_eq!(details.units, 2);
    }

    #[test]
    fn validate_rejects_short_order_id() {
        let mut f = fields();
        f.order_id = "ab".to_string();
        let err = f.validate().unwrap_err();
        assert_eq!(err.rule, "orderId must be at least 4 characters");
    }

    #[test]
    fn validate_rejects_zero_units() {
        let mut f = fields();
        f.units = 0;
        assert!(f.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_price() {
        let mut f = fields();
        f.price = -0.01;
        assert!(f.clone().validate().is_err());
        f.price = f64::NAN;
        assert!(f.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_sku_and_user() {
        let mut f = fields();
        f.sku = "   ".to_string();
        assert!(f.clone().validate().is_err());
        f.sku = "SKU-001".to_string();
        f.user_id = String::new();
        assert!(f.validate().is_err());
    }

    #[test]
    fn accepted_keeps_previous_retries_and_created_at() {
        let details = fields().validate().unwrap();
        let failed = OrderPaymentData::failed(&details, None, ts(0));
        assert_eq!(failed.payment_retries, 1);

        let accepted =
            OrderPaymentData::accepted(&details, "p1".to_string(), Some(&failed), ts(5));
        assert_eq!(accepted.payment_status, PaymentStatus::Accepted);
        assert_eq!(accepted.payment_retries, 1);
        assert_eq!(accepted.payment_id.as_deref(), Some("p1"));
        assert_eq!(accepted.created_at, ts(0));
        assert_eq!(accepted.updated_at, ts(5));
    }

    #[test]
    fn fresh_accepted_record_has_zero_retries() {
        let details = fields().validate().unwrap();
        let accepted = OrderPaymentData::accepted(&details, "p1".to_string(), None, ts(0));
        assert_eq!(accepted.payment_retries, 0);
        assert_eq!(accepted.created_at, ts(0));
    }

    #[test]
    fn failed_bumps_retry_counter() {
        let details = fields().validate().unwrap();
        let first = OrderPaymentData::failed(&details, None, ts(0));
        let second = OrderPaymentData::failed(&details, Some(&first), ts(1));
        let third = OrderPaymentData::failed(&details, Some(&second), ts(2));
        assert_eq!(first.payment_retries, 1);
        assert_eq!(second.payment_retries, 2);
        assert_eq!(third.payment_retries, 3);
    }

    #[test]
    fn force_rejected_keeps_payment_id_and_retries() {
        let details = fields().validate().unwrap();
        let mut capped = OrderPaymentData::failed(&details, None, ts(0));
        capped.payment_retries = 3;
        capped.payment_id = Some("p9".to_string());

        let rejected = OrderPaymentData::force_rejected(&capped, ts(7));
        assert_eq!(rejected.payment_status, PaymentStatus::Rejected);
        assert_eq!(rejected.payment_retries, 3);
        assert_eq!(rejected.payment_id.as_deref(), Some("p9"));
        assert_eq!(rejected.updated_at, ts(7));
        assert!(rejected.is_terminal());
    }

    #[test]
    fn record_serializes_with_camel_case_wire_names() {
        let details = fields().validate().unwrap();
        let record = OrderPaymentData::accepted(&details, "p1".to_string(), None, ts(0));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["orderId"], "mockOrderId");
        assert_eq!(json["paymentStatus"], "PAYMENT_ACCEPTED");
        assert_eq!(json["paymentRetries"], 0);
    }
}
