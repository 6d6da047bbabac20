//! Saga orchestration for the order payment lifecycle.
//!
//! The payment saga consumes a stock-allocated event and drives one order's
//! payment to a terminal outcome:
//! 1. Read the current payment record (may be absent).
//! 2. Submit to the gateway, retry a failed attempt, or short-circuit an
//!    already-resolved payment.
//! 3. Write the new state with an optimistic-concurrency precondition.
//! 4. Raise exactly one terminal domain event (accepted or rejected).
//!
//! Every step is idempotent or conditionally safe, so redelivered messages
//! and concurrent invocations converge on the same terminal state. The
//! allocation saga is the structurally identical upstream sibling that
//! turns an order-created event into a stock-allocated event.

pub mod allocation;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod payment;

pub use allocation::AllocationOrchestrator;
pub use error::SagaError;
pub use gateway::{
    GatewayBehavior, GatewayError, GatewayResponse, GatewayStatus, PaymentGateway, PaymentRequest,
    SimulatedGateway,
};
pub use handler::EventHandler;
pub use payment::{MAX_PAYMENT_RETRIES, PaymentOrchestrator};
