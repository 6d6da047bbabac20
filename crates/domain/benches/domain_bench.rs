use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{InMemoryPaymentStore, OrderFields, OrderPaymentData, PaymentStore};

fn fields(order_id: &str) -> OrderFields {
    OrderFields {
        order_id: order_id.to_string(),
        sku: "SKU-001".to_string(),
        units: 2,
        price: 19.99,
        user_id: "user-42".to_string(),
    }
}

fn bench_validate(c: &mut Criterion) {
    c.bench_function("domain/validate_order_fields", |b| {
        b.iter(|| {
            let details = fields("mockOrderId").validate().unwrap();
            assert_eq!(details.units, 2);
        });
    });
}

fn bench_transitions(c: &mut Criterion) {
    let details = fields("mockOrderId").validate().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

    c.bench_function("domain/failed_then_accepted_transition", |b| {
        b.iter(|| {
            let failed = OrderPaymentData::failed(&details, None, now);
            let accepted =
                OrderPaymentData::accepted(&details, "p1".to_string(), Some(&failed), now);
            assert_eq!(accepted.payment_retries, 1);
        });
    });
}

fn bench_conditional_writes(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

    c.bench_function("domain/record_1000_orders", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryPaymentStore::new();
                for i in 0..1000 {
                    let details = fields(&format!("order-{i:04}")).validate().unwrap();
                    let record =
                        OrderPaymentData::accepted(&details, format!("p{i}"), None, now);
                    store.record(None, record).await.unwrap();
                }
            });
        });
    });
}

criterion_group!(benches, bench_validate, bench_transitions, bench_conditional_writes);
criterion_main!(benches);
