//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the workflow
/// (an order was placed, a delivery was completed). They are immutable
/// and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name, used for storage and filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for event-sourced aggregates.
///
/// An aggregate is rebuilt by replaying its events: commands validate
/// against current state and produce events; `apply` folds an event into
/// the state.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name, used for event store organization.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the current version of the aggregate.
    fn version(&self) -> Version;

    /// Sets the aggregate version. Called by the command handler after
    /// loading or appending events.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be pure and deterministic, must not fail: events are facts
    /// that have already happened.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Trait for aggregates that support snapshotting.
///
/// The aggregate state is periodically serialized so that loading replays
/// only the events after the latest snapshot.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns the snapshot interval (number of events between snapshots).
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        let version = self.version().as_i64();
        version > 0 && (version as usize).is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum ParcelEvent {
        Registered { label: String },
        Weighed { grams: u32 },
    }

    impl DomainEvent for ParcelEvent {
        fn event_type(&self) -> &'static str {
            match self {
                ParcelEvent::Registered { .. } => "ParcelRegistered",
                ParcelEvent::Weighed { .. } => "ParcelWeighed",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Parcel {
        id: Option<AggregateId>,
        label: String,
        grams: u32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("parcel error")]
    struct ParcelError;

    impl Aggregate for Parcel {
        type Event = ParcelEvent;
        type Error = ParcelError;

        fn aggregate_type() -> &'static str {
            "Parcel"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                ParcelEvent::Registered { label } => {
                    if self.id.is_none() {
                        self.id = Some(AggregateId::new());
                    }
                    self.label = label;
                }
                ParcelEvent::Weighed { grams } => {
                    self.grams = grams;
                }
            }
        }
    }

    impl SnapshotCapable for Parcel {}

    #[test]
    fn apply_events_folds_in_order() {
        let mut parcel = Parcel::default();
        parcel.apply_events(vec![
            ParcelEvent::Registered {
                label: "box".to_string(),
            },
            ParcelEvent::Weighed { grams: 1200 },
        ]);

        assert!(parcel.id().is_some());
        assert_eq!(parcel.grams, 1200);
    }

    #[test]
    fn event_type_names() {
        let event = ParcelEvent::Registered {
            label: "box".to_string(),
        };
        assert_eq!(event.event_type(), "ParcelRegistered");
    }

    #[test]
    fn snapshot_interval_policy() {
        let mut parcel = Parcel::default();
        assert!(!parcel.should_snapshot());

        parcel.set_version(Version::new(100));
        assert!(parcel.should_snapshot());

        parcel.set_version(Version::new(101));
        assert!(!parcel.should_snapshot());
    }
}
