//! Batch submission endpoints: the HTTP stand-in for the queue collaborator.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use saga::EventHandler;

use crate::batch::{BatchOutcome, BatchProcessor, MessageBatch};

/// Shared worker state: one batch processor per event type.
pub struct AppState {
    pub payments: BatchProcessor<Arc<dyn EventHandler>>,
    pub allocations: BatchProcessor<Arc<dyn EventHandler>>,
}

/// POST /batches/payments — run a batch through the payment worker.
///
/// The raw body goes through the fail-open batch parser, so malformed input
/// produces an empty outcome rather than a client error.
#[tracing::instrument(skip(state, body))]
pub async fn payments(State(state): State<Arc<AppState>>, body: String) -> Json<BatchOutcome> {
    Json(state.payments.process(MessageBatch::from_json(&body)).await)
}

/// POST /batches/allocations — run a batch through the allocation worker.
#[tracing::instrument(skip(state, body))]
pub async fn allocations(State(state): State<Arc<AppState>>, body: String) -> Json<BatchOutcome> {
    Json(
        state
            .allocations
            .process(MessageBatch::from_json(&body))
            .await,
    )
}
