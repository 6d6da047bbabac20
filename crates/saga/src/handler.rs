use async_trait::async_trait;
use domain::{EventEnvelope, OrderEventName};

use crate::error::SagaError;

/// A worker that consumes one kind of domain event.
///
/// The batch ingestion controller is generic over this seam, so the payment
/// and allocation workers share the same message plumbing.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// The event this handler consumes. Envelopes carrying any other name
    /// are rejected as invalid arguments.
    fn event_name(&self) -> OrderEventName;

    /// Processes one inbound event to completion.
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), SagaError>;
}

#[async_trait]
impl<H: EventHandler + ?Sized> EventHandler for std::sync::Arc<H> {
    fn event_name(&self) -> OrderEventName {
        (**self).event_name()
    }

    async fn handle(&self, envelope: EventEnvelope) -> Result<(), SagaError> {
        (**self).handle(envelope).await
    }
}
