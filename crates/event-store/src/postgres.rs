use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    EventRecord, EventStoreError, Result,
    store::{EventStore, EventStream, validate_record},
};

/// PostgreSQL-backed event store implementation.
///
/// The conditional raise is expressed as `INSERT ... ON CONFLICT DO NOTHING`
/// against the `(subject_id, event_name)` primary key; zero affected rows
/// means the event was already raised.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<EventRecord> {
        Ok(EventRecord {
            subject_id: row.try_get("subject_id")?,
            event_name: row.try_get("event_name")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn raise(&self, record: EventRecord) -> Result<()> {
        validate_record(&record).map_err(EventStoreError::InvalidRecord)?;

        let result = sqlx::query(
            r#"
            INSERT INTO order_events (subject_id, event_name, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subject_id, event_name) DO NOTHING
            "#,
        )
        .bind(&record.subject_id)
        .bind(&record.event_name)
        .bind(&record.payload)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            metrics::counter!("event_store_duplicates_total").increment(1);
            return Err(EventStoreError::DuplicateEvent {
                subject_id: record.subject_id,
                event_name: record.event_name,
            });
        }

        tracing::debug!(
            subject_id = %record.subject_id,
            event_name = %record.event_name,
            "event raised"
        );
        Ok(())
    }

    async fn get_event(&self, subject_id: &str, event_name: &str) -> Result<Option<EventRecord>> {
        let row = sqlx::query(
            r#"
            SELECT subject_id, event_name, payload, created_at, updated_at
            FROM order_events
            WHERE subject_id = $1 AND event_name = $2
            "#,
        )
        .bind(subject_id)
        .bind(event_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn events_for_subject(&self, subject_id: &str) -> Result<Vec<EventRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT subject_id, event_name, payload, created_at, updated_at
            FROM order_events
            WHERE subject_id = $1
            ORDER BY created_at ASC, event_name ASC
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn stream_all(&self) -> Result<EventStream> {
        use futures_util::stream;

        let rows = sqlx::query(
            r#"
            SELECT subject_id, event_name, payload, created_at, updated_at
            FROM order_events
            ORDER BY created_at ASC, subject_id ASC, event_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let records: Vec<Result<EventRecord>> =
            rows.into_iter().map(Self::row_to_record).collect();
        Ok(Box::pin(stream::iter(records)))
    }
}
