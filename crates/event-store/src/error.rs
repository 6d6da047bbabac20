use thiserror::Error;

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The event has already been raised for this subject.
    ///
    /// This is the conditional-insert precondition firing. Callers that
    /// raise events idempotently absorb this as a benign no-op.
    #[error("event {event_name} already raised for subject {subject_id}")]
    DuplicateEvent {
        subject_id: String,
        event_name: String,
    },

    /// The record failed validation before any I/O was issued.
    #[error("invalid event record: {0}")]
    InvalidRecord(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true if the failure is expected to clear on redelivery.
    ///
    /// Duplicate raises and malformed records never will; everything else
    /// is an infrastructure fault worth retrying.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            EventStoreError::DuplicateEvent { .. } | EventStoreError::InvalidRecord(_)
        )
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_and_invalid_are_not_transient() {
        let dup = EventStoreError::DuplicateEvent {
            subject_id: "order-1".into(),
            event_name: "ORDER_PAYMENT_ACCEPTED".into(),
        };
        assert!(!dup.is_transient());
        assert!(!EventStoreError::InvalidRecord("empty subject".into()).is_transient());
    }

    #[test]
    fn database_errors_are_transient() {
        let err = EventStoreError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
    }
}
