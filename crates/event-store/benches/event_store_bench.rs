use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{EventRecord, EventStore, InMemoryEventStore};

fn make_record(subject: &str, event_name: &str) -> EventRecord {
    EventRecord::builder()
        .subject_id(subject)
        .event_name(event_name)
        .payload_raw(serde_json::json!({"orderId": subject, "units": 2, "price": 19.99}))
        .recorded_at(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        .build()
}

fn bench_raise_1000_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/raise_1000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                for i in 0..1000 {
                    let subject = format!("order-{i:04}");
                    store
                        .raise(make_record(&subject, "ORDER_PAYMENT_ACCEPTED"))
                        .await
                        .unwrap();
                }
            });
        });
    });
}

fn bench_duplicate_raise(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        store
            .raise(make_record("order-0001", "ORDER_PAYMENT_ACCEPTED"))
            .await
            .unwrap();
    });

    c.bench_function("event_store/duplicate_raise", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = store
                    .raise(make_record("order-0001", "ORDER_PAYMENT_ACCEPTED"))
                    .await;
                assert!(result.is_err());
            });
        });
    });
}

fn bench_events_for_subject(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(async {
        for i in 0..1000 {
            let subject = format!("order-{i:04}");
            store
                .raise(make_record(&subject, "ORDER_STOCK_ALLOCATED"))
                .await
                .unwrap();
        }
    });

    c.bench_function("event_store/events_for_subject_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let events = store.events_for_subject("order-0500").await.unwrap();
                assert_eq!(events.len(), 1);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_raise_1000_events,
    bench_duplicate_raise,
    bench_events_for_subject
);
criterion_main!(benches);
