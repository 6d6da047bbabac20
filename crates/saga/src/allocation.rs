//! Stock allocation orchestrator, the upstream sibling of the payment saga.
//!
//! Consumes an order-created event, validates the order fields, and raises
//! the stock-allocated event that triggers payment. Allocation itself is
//! unconditional here; inventory accounting lives outside this subsystem.

use async_trait::async_trait;
use common::Clock;
use domain::{EventEnvelope, OrderEventName, OrderFields};
use event_store::{EventStore, EventStoreError};

use crate::error::SagaError;
use crate::handler::EventHandler;

/// Turns order-created events into stock-allocated events.
pub struct AllocationOrchestrator<E, C>
where
    E: EventStore,
    C: Clock,
{
    events: E,
    clock: C,
}

impl<E, C> AllocationOrchestrator<E, C>
where
    E: EventStore,
    C: Clock,
{
    pub fn new(events: E, clock: C) -> Self {
        Self { events, clock }
    }

    /// Processes one order-created event, raising the follow-up
    /// stock-allocated event at most once.
    #[tracing::instrument(skip(self, envelope), fields(event = %envelope.event_name))]
    pub async fn process(&self, envelope: &EventEnvelope) -> Result<(), SagaError> {
        metrics::counter!("allocation_saga_total").increment(1);

        if envelope.event_name != OrderEventName::OrderCreated {
            return Err(SagaError::InvalidArguments(format!(
                "expected {} event, got {}",
                OrderEventName::OrderCreated,
                envelope.event_name
            )));
        }

        let fields: OrderFields = envelope
            .data()
            .map_err(|e| SagaError::InvalidArguments(format!("malformed event data: {e}")))?;
        let details = fields.validate()?;

        let follow_up = EventEnvelope::new(
            OrderEventName::StockAllocated,
            &details.to_fields(),
            self.clock.now(),
        )
        .map_err(|e| SagaError::Unrecognized(e.to_string()))?;

        match self
            .events
            .raise(follow_up.into_record(details.order_id.as_str()))
            .await
        {
            Ok(()) => {
                tracing::info!(order_id = %details.order_id, "stock allocated");
                Ok(())
            }
            // Redelivery: allocation already happened.
            Err(EventStoreError::DuplicateEvent { .. }) => {
                tracing::debug!(order_id = %details.order_id, "stock already allocated");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<E, C> EventHandler for AllocationOrchestrator<E, C>
where
    E: EventStore,
    C: Clock,
{
    fn event_name(&self) -> OrderEventName {
        OrderEventName::OrderCreated
    }

    async fn handle(&self, envelope: EventEnvelope) -> Result<(), SagaError> {
        self.process(&envelope).await
    }
}
