//! Payment state machine.

use serde::{Deserialize, Serialize};

/// The persisted status of an order's payment.
///
/// Together with absence-of-record this derives the saga state:
/// ```text
/// (no record) ──► Failed(retries) ──┬──► Accepted
///      │              │ retry cap   └──► Rejected
///      └──────────────┴──► Accepted | Rejected
/// ```
/// Accepted and Rejected are terminal: no further gateway submission may
/// occur for that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// A gateway attempt failed; the payment may be retried.
    #[serde(rename = "PAYMENT_FAILED")]
    Failed,

    /// The gateway accepted the payment (terminal state).
    #[serde(rename = "PAYMENT_ACCEPTED")]
    Accepted,

    /// The gateway rejected the payment, or the retry cap forced
    /// rejection (terminal state).
    #[serde(rename = "PAYMENT_REJECTED")]
    Rejected,
}

impl PaymentStatus {
    /// Returns true if no further gateway submission may occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Accepted | PaymentStatus::Rejected)
    }

    /// Returns the status name as stored on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Failed => "PAYMENT_FAILED",
            PaymentStatus::Accepted => "PAYMENT_ACCEPTED",
            PaymentStatus::Rejected => "PAYMENT_REJECTED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT_FAILED" => Ok(PaymentStatus::Failed),
            "PAYMENT_ACCEPTED" => Ok(PaymentStatus::Accepted),
            "PAYMENT_REJECTED" => Ok(PaymentStatus::Rejected),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Accepted.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(PaymentStatus::Failed.to_string(), "PAYMENT_FAILED");
        assert_eq!(PaymentStatus::Accepted.to_string(), "PAYMENT_ACCEPTED");
        assert_eq!(PaymentStatus::Rejected.to_string(), "PAYMENT_REJECTED");
    }

    #[test]
    fn from_str_roundtrip() {
        for status in [
            PaymentStatus::Failed,
            PaymentStatus::Accepted,
            PaymentStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("PAYMENT_PENDING".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn serialization_uses_wire_names() {
        let json = serde_json::to_string(&PaymentStatus::Accepted).unwrap();
        assert_eq!(json, "\"PAYMENT_ACCEPTED\"");
        let back: PaymentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PaymentStatus::Accepted);
    }
}
