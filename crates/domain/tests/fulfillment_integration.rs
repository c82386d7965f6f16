//! Integration tests for the order and delivery aggregates.
//!
//! These tests verify the full fulfillment lifecycle including event
//! persistence, aggregate reconstruction, and concurrency handling.

use std::sync::Arc;

use common::{Actor, AggregateId, UserId};
use domain::{
    Aggregate, CancelOrder, CompleteDelivery, DeliveryInfo, DeliveryService, DeliveryStatus,
    DomainError, InMemoryProductCatalog, Location, Money, OpenDelivery, OrderError,
    OrderItemRequest, OrderService, OrderStatus, PaymentMethod, PaymentOutcome, PlaceOrder,
    ProductId, ProductListing, RecordPayment, UpdateDeliveryStatus,
};
use event_store::{EventStoreError, InMemoryEventStore};

async fn seeded_catalog() -> InMemoryProductCatalog {
    let catalog = InMemoryProductCatalog::new();
    for (sku, name, cents) in [
        ("tomatoes-1kg", "Tomatoes 1kg", 450),
        ("eggs-12", "Eggs (dozen)", 300),
    ] {
        catalog
            .insert(ProductListing {
                product_id: ProductId::new(sku),
                name: name.to_string(),
                unit_price: Money::from_cents(cents),
            })
            .await;
    }
    catalog
}

async fn order_service(store: InMemoryEventStore) -> OrderService<InMemoryEventStore> {
    OrderService::new(store, Arc::new(seeded_catalog().await))
}

fn place_cmd(consumer: Actor) -> PlaceOrder {
    PlaceOrder::new(
        consumer.user_id,
        vec![
            OrderItemRequest::new("tomatoes-1kg", 2),
            OrderItemRequest::new("eggs-12", 1),
        ],
        DeliveryInfo::home_delivery("5 Lake Rd"),
        PaymentMethod::CashOnDelivery,
    )
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn placed_order_is_priced_and_processing() {
        let service = order_service(InMemoryEventStore::new()).await;
        let consumer = Actor::consumer(UserId::new());

        let result = service.place_order(consumer, place_cmd(consumer)).await.unwrap();

        assert_eq!(result.aggregate.status(), OrderStatus::Processing);
        assert_eq!(result.aggregate.total(), Money::from_cents(1200));
        assert_eq!(result.aggregate.items().len(), 2);
        assert_eq!(result.aggregate.status_history().len(), 2);
    }

    #[tokio::test]
    async fn order_rehydrates_from_its_stream() {
        let store = InMemoryEventStore::new();
        let service = order_service(store.clone()).await;
        let consumer = Actor::consumer(UserId::new());

        let cmd = place_cmd(consumer);
        let order_id = cmd.order_id;
        service.place_order(consumer, cmd).await.unwrap();
        service
            .record_payment(
                consumer,
                RecordPayment::new(
                    order_id,
                    Money::from_cents(1200),
                    PaymentMethod::CashOnDelivery,
                    PaymentOutcome::Succeeded,
                ),
            )
            .await
            .unwrap();

        // Fresh service over the same store sees the same state.
        let reloaded = order_service(store).await.get_order(order_id).await.unwrap();
        assert_eq!(reloaded.status(), OrderStatus::Processing);
        assert!(reloaded.is_paid());
        assert_eq!(reloaded.version(), event_store::Version::new(3));
    }

    #[tokio::test]
    async fn status_history_is_append_only_audit() {
        let service = order_service(InMemoryEventStore::new()).await;
        let consumer = Actor::consumer(UserId::new());

        let cmd = place_cmd(consumer);
        let order_id = cmd.order_id;
        service.place_order(consumer, cmd).await.unwrap();
        service
            .cancel_order(consumer, CancelOrder::new(order_id, "found a better price"))
            .await
            .unwrap();

        let order = service.get_order(order_id).await.unwrap();
        let statuses: Vec<OrderStatus> =
            order.status_history().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Processing,
                OrderStatus::Cancelled
            ]
        );
        assert_eq!(
            order.status_history().last().unwrap().updated_by.user_id,
            consumer.user_id
        );
    }

    #[tokio::test]
    async fn cancel_by_stranger_is_forbidden() {
        let service = order_service(InMemoryEventStore::new()).await;
        let consumer = Actor::consumer(UserId::new());
        let cmd = place_cmd(consumer);
        let order_id = cmd.order_id;
        service.place_order(consumer, cmd).await.unwrap();

        let stranger = Actor::consumer(UserId::new());
        let err = service
            .cancel_order(stranger, CancelOrder::new(order_id, "not mine"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Order(OrderError::NotAuthorized { .. })
        ));
    }
}

mod delivery_lifecycle {
    use super::*;

    #[tokio::test]
    async fn delivery_runs_to_completion() {
        let service = DeliveryService::new(InMemoryEventStore::new());
        let courier = Actor::deliverer(UserId::new());

        let cmd = OpenDelivery::new(
            AggregateId::new(),
            courier.user_id,
            Location::new("Green Acres Farm"),
            Location::new("5 Lake Rd"),
        );
        let delivery_id = cmd.delivery_id;
        service.open_delivery(courier, cmd).await.unwrap();

        for status in [DeliveryStatus::PickedUp, DeliveryStatus::InTransit] {
            service
                .update_status(courier, UpdateDeliveryStatus::new(delivery_id, status))
                .await
                .unwrap();
        }
        service
            .complete_delivery(courier, CompleteDelivery::new(delivery_id))
            .await
            .unwrap();

        let delivery = service.get_delivery(delivery_id).await.unwrap();
        assert_eq!(delivery.status(), DeliveryStatus::Delivered);
        assert!(delivery.actual_delivery_time().is_some());
        assert!(delivery.is_terminal());
    }

    #[tokio::test]
    async fn terminal_delivery_rejects_further_updates() {
        let service = DeliveryService::new(InMemoryEventStore::new());
        let courier = Actor::deliverer(UserId::new());

        let cmd = OpenDelivery::new(
            AggregateId::new(),
            courier.user_id,
            Location::new("Green Acres Farm"),
            Location::new("5 Lake Rd"),
        );
        let delivery_id = cmd.delivery_id;
        service.open_delivery(courier, cmd).await.unwrap();
        service
            .fail_delivery(courier, domain::FailDelivery::new(delivery_id, "flat tire"))
            .await
            .unwrap();

        let err = service
            .update_status(
                courier,
                UpdateDeliveryStatus::new(delivery_id, DeliveryStatus::PickedUp),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Delivery(_)));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_cancellations_have_one_winner() {
        let store = InMemoryEventStore::new();
        let service = Arc::new(order_service(store).await);
        let consumer = Actor::consumer(UserId::new());
        let cmd = place_cmd(consumer);
        let order_id = cmd.order_id;
        service.place_order(consumer, cmd).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .cancel_order(consumer, CancelOrder::new(order_id, format!("racer {i}")))
                    .await
            }));
        }

        let mut won = 0;
        let mut lost = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => {
                    lost += 1
                }
                // A racer that loaded after the winner sees a terminal order.
                Err(DomainError::Order(OrderError::Transition(_))) => lost += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(lost, 3);
    }
}
