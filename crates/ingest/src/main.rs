//! Ingestion worker entry point.

use std::sync::Arc;

use common::SystemClock;
use domain::PostgresPaymentStore;
use event_store::PostgresEventStore;
use ingest::config::Config;
use saga::{AllocationOrchestrator, EventHandler, PaymentOrchestrator, SimulatedGateway};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Wires both workers against PostgreSQL-backed stores.
async fn create_postgres_state(
    database_url: &str,
    config: &Config,
) -> Result<Arc<ingest::AppState>, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    let events = PostgresEventStore::new(pool.clone());
    events.run_migrations().await?;
    let records = PostgresPaymentStore::new(pool);

    let gateway = SimulatedGateway::with_behavior(config.gateway_mode);
    let clock = SystemClock::new();

    let payment_handler: Arc<dyn EventHandler> = Arc::new(PaymentOrchestrator::new(
        records,
        events.clone(),
        gateway,
        clock,
    ));
    let allocation_handler: Arc<dyn EventHandler> =
        Arc::new(AllocationOrchestrator::new(events, clock));

    Ok(ingest::create_state(payment_handler, allocation_handler))
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the workers against the configured backend
    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            tracing::info!("using PostgreSQL-backed stores");
            create_postgres_state(database_url, &config)
                .await
                .expect("failed to connect to PostgreSQL")
        }
        None => {
            tracing::info!("no DATABASE_URL set, using in-memory stores");
            ingest::create_in_memory_state(config.gateway_mode)
        }
    };

    // 4. Build the application and start serving
    let app = ingest::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, gateway_mode = ?config.gateway_mode, "starting ingestion worker");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("worker shut down gracefully");
}
