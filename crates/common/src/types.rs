use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an order identifier fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order id {value:?}: must be at least {} characters", OrderId::MIN_LEN)]
pub struct InvalidOrderId {
    pub value: String,
}

/// Stable identifier for an order.
///
/// Wraps the caller-supplied string to provide type safety and prevent
/// mixing up order ids with other string-based identifiers. Construction
/// enforces the minimum-length rule, so a held `OrderId` is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Minimum accepted length for an order id.
    pub const MIN_LEN: usize = 4;

    /// Creates an order id, rejecting values shorter than [`Self::MIN_LEN`].
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidOrderId> {
        let value = value.into();
        if value.trim().len() < Self::MIN_LEN {
            return Err(InvalidOrderId { value });
        }
        Ok(Self(value))
    }

    /// Returns the order id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderId {
    type Err = InvalidOrderId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}
