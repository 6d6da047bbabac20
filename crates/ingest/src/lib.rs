//! HTTP ingestion worker for the order payment saga.
//!
//! Stands in for the external queue collaborator: batches of messages are
//! posted over HTTP, run through the batch controller, and answered with the
//! message ids to redeliver. Ships structured logging (tracing) and
//! Prometheus metrics.

pub mod batch;
pub mod config;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::SystemClock;
use domain::InMemoryPaymentStore;
use event_store::InMemoryEventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    AllocationOrchestrator, EventHandler, GatewayBehavior, PaymentOrchestrator, SimulatedGateway,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use batch::BatchProcessor;
pub use routes::batches::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/batches/payments", post(routes::batches::payments))
        .route("/batches/allocations", post(routes::batches::allocations))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires both workers from the given handlers.
pub fn create_state(
    payment_handler: Arc<dyn EventHandler>,
    allocation_handler: Arc<dyn EventHandler>,
) -> Arc<AppState> {
    Arc::new(AppState {
        payments: BatchProcessor::new(payment_handler),
        allocations: BatchProcessor::new(allocation_handler),
    })
}

/// Wires the worker on the in-memory backends with a simulated gateway.
/// Used in tests and when no `DATABASE_URL` is configured.
pub fn create_in_memory_state(gateway_mode: GatewayBehavior) -> Arc<AppState> {
    let events = InMemoryEventStore::new();
    let records = InMemoryPaymentStore::new();
    let gateway = SimulatedGateway::with_behavior(gateway_mode);
    let clock = SystemClock::new();

    let payment_handler: Arc<dyn EventHandler> = Arc::new(PaymentOrchestrator::new(
        records,
        events.clone(),
        gateway,
        clock,
    ));
    let allocation_handler: Arc<dyn EventHandler> =
        Arc::new(AllocationOrchestrator::new(events, clock));

    create_state(payment_handler, allocation_handler)
}
