use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    EventRecord, EventStoreError, Result,
    store::{EventStore, EventStream, validate_record},
};

/// In-memory event store implementation.
///
/// Stores records in a map keyed by `(subject_id, event_name)`, giving the
/// same conditional-insert semantics as the PostgreSQL implementation.
/// Used in tests and in the default worker wiring.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    records: Arc<RwLock<BTreeMap<(String, String), EventRecord>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all events.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn raise(&self, record: EventRecord) -> Result<()> {
        validate_record(&record).map_err(EventStoreError::InvalidRecord)?;

        let key = (record.subject_id.clone(), record.event_name.clone());
        let mut store = self.records.write().await;

        if store.contains_key(&key) {
            metrics::counter!("event_store_duplicates_total").increment(1);
            return Err(EventStoreError::DuplicateEvent {
                subject_id: key.0,
                event_name: key.1,
            });
        }

        tracing::debug!(
            subject_id = %record.subject_id,
            event_name = %record.event_name,
            "event raised"
        );
        store.insert(key, record);
        Ok(())
    }

    async fn get_event(&self, subject_id: &str, event_name: &str) -> Result<Option<EventRecord>> {
        let store = self.records.read().await;
        Ok(store
            .get(&(subject_id.to_string(), event_name.to_string()))
            .cloned())
    }

    async fn events_for_subject(&self, subject_id: &str) -> Result<Vec<EventRecord>> {
        let store = self.records.read().await;
        let mut events: Vec<_> = store
            .values()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.event_name.cmp(&b.event_name))
        });
        Ok(events)
    }

    async fn stream_all(&self) -> Result<EventStream> {
        use futures_util::stream;

        let store = self.records.read().await;
        let mut events: Vec<_> = store.values().cloned().collect();
        events.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.subject_id.cmp(&b.subject_id))
                .then_with(|| a.event_name.cmp(&b.event_name))
        });

        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }
}
