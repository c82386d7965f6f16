use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

#[derive(Default)]
struct StoreState {
    /// All events in insertion order.
    log: Vec<EventEnvelope>,
    /// Current version per aggregate, kept in lockstep with the log.
    versions: HashMap<AggregateId, Version>,
    snapshots: HashMap<AggregateId, Snapshot>,
    /// Number of upcoming appends that fail with `Unavailable`.
    fail_appends: u32,
}

/// In-memory event store.
///
/// Backs tests and single-process deployments. The version check and the
/// append happen under one write lock, so concurrent appends at the same
/// expected version resolve to exactly one winner - the same contract a
/// database-backed store provides with a unique (aggregate_id, version)
/// constraint.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.log.len()
    }

    /// Makes the next `count` append calls fail with `Unavailable`.
    ///
    /// Simulates a persistence timeout, the only failure-injection point
    /// the core recognizes.
    pub async fn set_fail_next_appends(&self, count: u32) {
        self.state.write().await.fail_appends = count;
    }

    /// Clears all events and snapshots.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.log.clear();
        state.versions.clear();
        state.snapshots.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let mut state = self.state.write().await;

        if state.fail_appends > 0 {
            state.fail_appends -= 1;
            return Err(EventStoreError::Unavailable(
                "simulated persistence timeout".to_string(),
            ));
        }

        let current_version = state
            .versions
            .get(&aggregate_id)
            .copied()
            .unwrap_or_else(Version::initial);

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // The batch must continue the stream even without an explicit check.
        if events[0].version != current_version.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events[events.len() - 1].version;
        state.versions.insert(aggregate_id, last_version);
        state.log.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = state
            .log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let mut events = self.get_events_for_aggregate(aggregate_id).await?;
        events.retain(|e| e.version >= from_version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = state
            .log
            .iter()
            .filter(|e| {
                query.matches(
                    e.aggregate_id,
                    &e.aggregate_type,
                    &e.event_type,
                    e.version,
                    e.timestamp,
                )
            })
            .cloned()
            .collect();

        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.version.cmp(&b.version))
        });

        let offset = query.offset.unwrap_or(0);
        let events = events.into_iter().skip(offset);
        let events = match query.limit {
            Some(limit) => events.take(limit).collect(),
            None => events.collect(),
        };

        Ok(events)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let mut events: Vec<_> = state
            .log
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let state = self.state.read().await;
        let events = state.log.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let state = self.state.read().await;
        Ok(state.versions.get(&aggregate_id).copied())
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut state = self.state.write().await;
        state.snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let state = self.state.read().await;
        Ok(state.snapshots.get(&aggregate_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(
        aggregate_id: AggregateId,
        version: Version,
        event_type: &str,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Order")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        let event = create_test_event(aggregate_id, Version::first(), "OrderPlaced");

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::first());

        let events = store.get_events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_batch_returns_last_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            create_test_event(aggregate_id, Version::new(1), "OrderPlaced"),
            create_test_event(aggregate_id, Version::new(2), "OrderProcessing"),
            create_test_event(aggregate_id, Version::new(3), "OrderShipped"),
        ];

        let result = store.append(events, AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::new(3));

        let stored = store.get_events_for_aggregate(aggregate_id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn append_with_stale_version_conflicts() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = create_test_event(aggregate_id, Version::first(), "OrderPlaced");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        // A writer that still believes the aggregate is new loses.
        let event2 = create_test_event(aggregate_id, Version::first(), "OrderProcessing");
        let result = store
            .append(vec![event2], AppendOptions::expect_new())
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn append_with_matching_version_succeeds() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = create_test_event(aggregate_id, Version::first(), "OrderPlaced");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = create_test_event(aggregate_id, Version::new(2), "OrderProcessing");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::first()),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn concurrent_appends_have_one_winner() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = create_test_event(aggregate_id, Version::first(), "OrderPlaced");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let event = create_test_event(aggregate_id, Version::new(2), "OrderShipped");
                store
                    .append(
                        vec![event],
                        AppendOptions::expect_version(Version::first()),
                    )
                    .await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(EventStoreError::ConcurrencyConflict { .. }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn get_events_from_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            create_test_event(aggregate_id, Version::new(1), "OrderPlaced"),
            create_test_event(aggregate_id, Version::new(2), "OrderProcessing"),
            create_test_event(aggregate_id, Version::new(3), "OrderShipped"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let from_v2 = store
            .get_events_for_aggregate_from_version(aggregate_id, Version::new(2))
            .await
            .unwrap();
        assert_eq!(from_v2.len(), 2);
        assert_eq!(from_v2[0].version, Version::new(2));
        assert_eq!(from_v2[1].version, Version::new(3));
    }

    #[tokio::test]
    async fn get_events_by_type() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        store
            .append(
                vec![create_test_event(id1, Version::first(), "OrderPlaced")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(id2, Version::first(), "OrderPlaced")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(id1, Version::new(2), "OrderShipped")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let placed = store.get_events_by_type("OrderPlaced").await.unwrap();
        assert_eq!(placed.len(), 2);

        let shipped = store.get_events_by_type("OrderShipped").await.unwrap();
        assert_eq!(shipped.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_injection_fails_then_recovers() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        store.set_fail_next_appends(1).await;

        let event = create_test_event(aggregate_id, Version::first(), "OrderPlaced");
        let result = store
            .append(vec![event.clone()], AppendOptions::expect_new())
            .await;
        assert!(matches!(result, Err(EventStoreError::Unavailable(_))));

        // The failed attempt must not have persisted anything.
        assert_eq!(store.event_count().await, 0);

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn snapshot_save_and_retrieve() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let snapshot = Snapshot::new(
            aggregate_id,
            "Order",
            Version::new(5),
            serde_json::json!({"status": "Shipped"}),
        );

        store.save_snapshot(snapshot).await.unwrap();

        let retrieved = store.get_snapshot(aggregate_id).await.unwrap().unwrap();
        assert_eq!(retrieved.aggregate_id, aggregate_id);
        assert_eq!(retrieved.version, Version::new(5));
    }

    #[tokio::test]
    async fn snapshot_not_found() {
        let store = InMemoryEventStore::new();
        let result = store.get_snapshot(AggregateId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn query_events_with_filters() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();

        let events = vec![
            create_test_event(id1, Version::new(1), "OrderPlaced"),
            create_test_event(id1, Version::new(2), "OrderProcessing"),
            create_test_event(id1, Version::new(3), "OrderShipped"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let query = EventQuery::new()
            .aggregate_id(id1)
            .from_version(Version::new(2))
            .to_version(Version::new(2));

        let results = store.query_events(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn stream_all_events_in_insertion_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        store
            .append(
                vec![create_test_event(id1, Version::first(), "OrderPlaced")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(id2, Version::first(), "OrderPlaced")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let stream = store.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().aggregate_id, id1);
        assert_eq!(events[1].as_ref().unwrap().aggregate_id, id2);
    }

    #[tokio::test]
    async fn get_aggregate_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let version = store.get_aggregate_version(aggregate_id).await.unwrap();
        assert!(version.is_none());

        let events = vec![
            create_test_event(aggregate_id, Version::new(1), "OrderPlaced"),
            create_test_event(aggregate_id, Version::new(2), "OrderProcessing"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let version = store.get_aggregate_version(aggregate_id).await.unwrap();
        assert_eq!(version, Some(Version::new(2)));
    }
}
