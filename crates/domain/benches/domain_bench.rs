use std::sync::Arc;

use common::{Actor, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Aggregate, DeliveryInfo, InMemoryProductCatalog, Money, Order, OrderEvent, OrderItemRequest,
    OrderService, PaymentMethod, PlaceOrder, ProductId, ProductListing,
};
use event_store::InMemoryEventStore;

fn catalog(rt: &tokio::runtime::Runtime) -> Arc<InMemoryProductCatalog> {
    let catalog = InMemoryProductCatalog::new();
    rt.block_on(catalog.insert(ProductListing {
        product_id: ProductId::new("sku-bench"),
        name: "Benchmark Crate".to_string(),
        unit_price: Money::from_cents(1000),
    }));
    Arc::new(catalog)
}

fn bench_place_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let catalog = catalog(&rt);

    c.bench_function("domain/place_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = OrderService::new(InMemoryEventStore::new(), catalog.clone());
                let consumer = Actor::consumer(UserId::new());
                let cmd = PlaceOrder::new(
                    consumer.user_id,
                    vec![OrderItemRequest::new("sku-bench", 2)],
                    DeliveryInfo::home_delivery("5 Lake Rd"),
                    PaymentMethod::CashOnDelivery,
                );
                service.place_order(consumer, cmd).await.unwrap();
            });
        });
    });
}

fn bench_order_replay(c: &mut Criterion) {
    let consumer = Actor::consumer(UserId::new());
    let seed = Order::default();
    let events: Vec<OrderEvent> = seed
        .place(
            common::AggregateId::new(),
            consumer,
            consumer.user_id,
            vec![domain::OrderItem {
                product_id: ProductId::new("sku-bench"),
                product_name: "Benchmark Crate".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
            }],
            DeliveryInfo::home_delivery("5 Lake Rd"),
            PaymentMethod::CashOnDelivery,
        )
        .unwrap();

    c.bench_function("domain/order_replay", |b| {
        b.iter(|| {
            let mut order = Order::default();
            order.apply_events(events.clone());
            order
        });
    });
}

criterion_group!(benches, bench_place_order, bench_order_replay);
criterion_main!(benches);
