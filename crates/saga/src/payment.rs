//! Payment orchestrator: the core saga state machine.

use async_trait::async_trait;
use common::Clock;
use domain::{
    EventEnvelope, OrderDetails, OrderEventName, OrderFields, OrderPaymentData, PaymentStatus,
    PaymentStore, PaymentStoreError,
};
use event_store::{EventStore, EventStoreError};

use crate::error::SagaError;
use crate::gateway::{GatewayError, GatewayStatus, PaymentGateway, PaymentRequest};
use crate::handler::EventHandler;

/// Maximum recorded retries before a failed payment is force-rejected
/// without another gateway call. The literal comparison is
/// `payment_retries >= MAX_PAYMENT_RETRIES`.
pub const MAX_PAYMENT_RETRIES: u32 = 3;

/// Drives one order's payment to a terminal outcome.
///
/// Per invocation the orchestrator performs at most one gateway call, one
/// record write, and one event write. Redelivery and concurrent invocations
/// are safe: the record write carries the previously-read state as a
/// precondition and the event write is a conditional insert.
pub struct PaymentOrchestrator<R, E, G, C>
where
    R: PaymentStore,
    E: EventStore,
    G: PaymentGateway,
    C: Clock,
{
    records: R,
    events: E,
    gateway: G,
    clock: C,
}

impl<R, E, G, C> PaymentOrchestrator<R, E, G, C>
where
    R: PaymentStore,
    E: EventStore,
    G: PaymentGateway,
    C: Clock,
{
    /// Creates a new payment orchestrator.
    pub fn new(records: R, events: E, gateway: G, clock: C) -> Self {
        Self {
            records,
            events,
            gateway,
            clock,
        }
    }

    /// Processes one stock-allocated event to completion.
    #[tracing::instrument(skip(self, envelope), fields(event = %envelope.event_name))]
    pub async fn process(&self, envelope: &EventEnvelope) -> Result<(), SagaError> {
        metrics::counter!("payment_saga_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(envelope).await;

        metrics::histogram!("payment_saga_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(()) => metrics::counter!("payment_saga_completed").increment(1),
            Err(e) => {
                metrics::counter!("payment_saga_failed", "kind" => e.kind()).increment(1);
                tracing::warn!(kind = e.kind(), transient = e.is_transient(), error = %e, "payment saga failed");
            }
        }
        result
    }

    async fn run(&self, envelope: &EventEnvelope) -> Result<(), SagaError> {
        if envelope.event_name != OrderEventName::StockAllocated {
            return Err(SagaError::InvalidArguments(format!(
                "expected {} event, got {}",
                OrderEventName::StockAllocated,
                envelope.event_name
            )));
        }

        let fields: OrderFields = envelope
            .data()
            .map_err(|e| SagaError::InvalidArguments(format!("malformed event data: {e}")))?;
        let details = fields.validate()?;

        let existing = self
            .records
            .load(&details.order_id)
            .await
            .map_err(store_fault)?;

        // Replay path: the payment is already resolved. Skip the gateway
        // and the record write; re-raising the terminal event is a no-op
        // when it was already recorded.
        if let Some(record) = existing.as_ref().filter(|r| r.is_terminal()) {
            tracing::info!(
                order_id = %record.order_id,
                status = %record.payment_status,
                "payment already resolved, re-raising terminal event"
            );
            return self.raise_terminal(record).await;
        }

        let (candidate, gateway_failure) = self.decide(&details, existing.as_ref()).await?;

        let resolved = match self.records.record(existing.as_ref(), candidate).await {
            Ok(stored) => stored,
            // A concurrent invocation finalized first. Keep the stored
            // terminal state instead of overwriting it.
            Err(PaymentStoreError::AlreadyAccepted(stored))
            | Err(PaymentStoreError::AlreadyRejected(stored)) => {
                metrics::counter!("payment_saga_races_absorbed").increment(1);
                tracing::info!(
                    order_id = %stored.order_id,
                    status = %stored.payment_status,
                    "concurrent finalization detected, adopting stored state"
                );
                *stored
            }
            Err(e) => return Err(store_fault(e)),
        };

        match resolved.payment_status {
            PaymentStatus::Accepted | PaymentStatus::Rejected => {
                self.raise_terminal(&resolved).await
            }
            // The failed state was durably recorded; propagate the gateway
            // failure so the message is redelivered.
            PaymentStatus::Failed => {
                Err(gateway_failure.unwrap_or_else(|| SagaError::PaymentFailed {
                    order_id: resolved.order_id.into_string(),
                    retries: resolved.payment_retries,
                }))
            }
        }
    }

    /// Decides the candidate next state, calling the gateway when the
    /// order is still submittable.
    ///
    /// Returns the candidate record plus, for a failed gateway attempt,
    /// the failure to propagate after the record write.
    async fn decide(
        &self,
        details: &OrderDetails,
        existing: Option<&OrderPaymentData>,
    ) -> Result<(OrderPaymentData, Option<SagaError>), SagaError> {
        let now = self.clock.now();

        if let Some(prev) = existing
            && prev.payment_retries >= MAX_PAYMENT_RETRIES
        {
            tracing::warn!(
                order_id = %prev.order_id,
                retries = prev.payment_retries,
                "retry cap reached, forcing rejection without gateway call"
            );
            return Ok((OrderPaymentData::force_rejected(prev, now), None));
        }

        let request =
            PaymentRequest::from_details(details, existing.map(|p| p.payment_status));

        match self.gateway.submit(request).await {
            Ok(response) => {
                let candidate = match response.status {
                    GatewayStatus::Accepted => OrderPaymentData::accepted(
                        details,
                        response.payment_id,
                        existing,
                        now,
                    ),
                    GatewayStatus::Rejected => OrderPaymentData::rejected(
                        details,
                        Some(response.payment_id),
                        existing,
                        now,
                    ),
                };
                Ok((candidate, None))
            }
            Err(GatewayError::PaymentFailed { order_id }) => {
                let candidate = OrderPaymentData::failed(details, existing, now);
                let failure = SagaError::PaymentFailed {
                    order_id,
                    retries: candidate.payment_retries,
                };
                Ok((candidate, Some(failure)))
            }
            Err(GatewayError::Unavailable(msg)) => Err(SagaError::Unrecognized(msg)),
        }
    }

    /// Raises the terminal event matching the resolved record, absorbing a
    /// duplicate raise as success.
    async fn raise_terminal(&self, record: &OrderPaymentData) -> Result<(), SagaError> {
        let event_name = match record.payment_status {
            PaymentStatus::Accepted => OrderEventName::PaymentAccepted,
            PaymentStatus::Rejected => OrderEventName::PaymentRejected,
            PaymentStatus::Failed => {
                return Err(SagaError::Unrecognized(
                    "cannot raise terminal event for unresolved payment".to_string(),
                ));
            }
        };

        let envelope = EventEnvelope::new(event_name, record, self.clock.now())
            .map_err(|e| SagaError::Unrecognized(e.to_string()))?;

        match self
            .events
            .raise(envelope.into_record(record.order_id.as_str()))
            .await
        {
            Ok(()) => {
                metrics::counter!("payment_events_raised_total").increment(1);
                tracing::info!(order_id = %record.order_id, event = %event_name, "terminal event raised");
                Ok(())
            }
            Err(EventStoreError::DuplicateEvent { .. }) => {
                tracing::debug!(order_id = %record.order_id, event = %event_name, "terminal event already raised");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn store_fault(e: PaymentStoreError) -> SagaError {
    SagaError::Unrecognized(e.to_string())
}

#[async_trait]
impl<R, E, G, C> EventHandler for PaymentOrchestrator<R, E, G, C>
where
    R: PaymentStore,
    E: EventStore,
    G: PaymentGateway,
    C: Clock,
{
    fn event_name(&self) -> OrderEventName {
        OrderEventName::StockAllocated
    }

    async fn handle(&self, envelope: EventEnvelope) -> Result<(), SagaError> {
        self.process(&envelope).await
    }
}
