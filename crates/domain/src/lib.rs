//! Domain layer for the order lifecycle workers.
//!
//! Defines the durable payment record and its state machine, the closed
//! vocabulary of domain events, input validation, and the payment record
//! store with optimistic-concurrency write semantics.

pub mod error;
pub mod events;
pub mod payment;

pub use error::{PaymentStoreError, ValidationError};
pub use events::{EventEnvelope, OrderEventName, UnknownEventName};
pub use payment::{
    InMemoryPaymentStore, OrderDetails, OrderFields, OrderPaymentData, PaymentStatus, PaymentStore,
    PostgresPaymentStore,
};
