//! Batch ingestion controller.
//!
//! Consumes a bounded batch of queue messages, drives the configured worker
//! once per message, and reports back which message ids must be redelivered.
//! Retry policy is orthogonal to the failure taxonomy: the controller only
//! inspects the transient flag.

use domain::EventEnvelope;
use saga::EventHandler;
use serde::{Deserialize, Serialize};

/// One inbound queue message: an opaque id plus a JSON-encoded event
/// envelope body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
}

/// A bounded batch of inbound messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageBatch {
    #[serde(default)]
    pub records: Vec<QueueMessage>,
}

impl MessageBatch {
    /// Parses a batch from raw input, failing open: null, absent, malformed,
    /// or record-less input yields an empty batch.
    pub fn from_json(input: &str) -> Self {
        match serde_json::from_str::<MessageBatch>(input) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, "malformed batch input, treating as empty");
                MessageBatch::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Subset of message ids that must be redelivered, in original batch order.
/// All other messages are acknowledged and removed from the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub retry_ids: Vec<String>,
}

/// Drives one event handler over message batches.
pub struct BatchProcessor<H: EventHandler> {
    handler: H,
}

impl<H: EventHandler> BatchProcessor<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Processes the batch sequentially, one message at a time.
    ///
    /// A message is queued for redelivery only when its handler failure is
    /// transient. Unparseable bodies and non-transient failures are dropped
    /// with a warning; a later redelivery could never succeed for them.
    #[tracing::instrument(skip(self, batch), fields(worker = %self.handler.event_name(), messages = batch.records.len()))]
    pub async fn process(&self, batch: MessageBatch) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for message in batch.records {
            metrics::counter!("batch_messages_total").increment(1);

            let envelope: EventEnvelope = match serde_json::from_str(&message.body) {
                Ok(envelope) => envelope,
                Err(e) => {
                    metrics::counter!("batch_messages_dropped").increment(1);
                    tracing::warn!(
                        message_id = %message.message_id,
                        error = %e,
                        "dropping unparseable message body"
                    );
                    continue;
                }
            };

            match self.handler.handle(envelope).await {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    metrics::counter!("batch_messages_retried").increment(1);
                    tracing::info!(
                        message_id = %message.message_id,
                        kind = e.kind(),
                        "transient failure, queueing message for redelivery"
                    );
                    outcome.retry_ids.push(message.message_id);
                }
                Err(e) => {
                    metrics::counter!("batch_messages_dropped").increment(1);
                    tracing::warn!(
                        message_id = %message.message_id,
                        kind = e.kind(),
                        error = %e,
                        "dropping message after non-transient failure"
                    );
                }
            }
        }

        outcome
    }
}
