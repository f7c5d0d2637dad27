use crate::state::{Origin, World, WorldStore, WorldUpdate};
use crate::sync::protocol::WireDiff;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

/// A live subscriber's view, handed out by [`SyncHub::subscribe`].
pub struct Subscription {
    /// Identity used to exclude this connection from its own updates.
    pub id: Uuid,

    /// Delivery cursor into the update ring.
    pub updates: broadcast::Receiver<WorldUpdate>,

    /// World as of subscribe time.
    pub snapshot: World,
}

/// Connection registry and broadcast fan-out.
///
/// The hub registers the engine's single store listener, which turns every
/// committed mutation into a [`WorldUpdate`] on a broadcast channel. Each
/// subscriber owns a receiver (its cursor into the append-only ring) and
/// is woken on publish rather than polling. A record retires once every
/// live receiver has passed it.
pub struct SyncHub {
    store: Arc<WorldStore>,
    update_tx: broadcast::Sender<WorldUpdate>,
    connections: DashMap<Uuid, DateTime<Utc>>,
}

impl SyncHub {
    /// Wire a hub to `store`, registering its mutation listener.
    pub fn new(store: Arc<WorldStore>, capacity: usize) -> Self {
        let (update_tx, _) = broadcast::channel(capacity);

        let tx = update_tx.clone();
        store.bus().register(Box::new(move |origin, entity_id, fields| {
            let update = WorldUpdate {
                origin,
                entity_id: entity_id.to_string(),
                fields: fields.clone(),
                timestamp: Utc::now(),
            };
            // No live receivers means nothing to fan out to.
            let _ = tx.send(update);
        }));

        Self {
            store,
            update_tx,
            connections: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<WorldStore> {
        &self.store
    }

    /// Register a new connection and hand it a full snapshot.
    ///
    /// The receiver is obtained before the snapshot is taken, so a mutation
    /// committed between the two is delivered rather than lost; one that
    /// lands in both re-merges to the same record under last-write-wins.
    pub fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let updates = self.update_tx.subscribe();
        let snapshot = self.store.snapshot();
        self.connections.insert(id, Utc::now());

        info!(
            client = %id,
            connections = self.connections.len(),
            "subscriber connected"
        );
        Subscription {
            id,
            updates,
            snapshot,
        }
    }

    /// Remove a connection from the registry. Records it had not yet
    /// consumed are simply skipped for it; its cursor is released when the
    /// subscription's receiver is dropped.
    pub fn unsubscribe(&self, id: Uuid) {
        if self.connections.remove(&id).is_some() {
            info!(
                client = %id,
                connections = self.connections.len(),
                "subscriber disconnected"
            );
        }
    }

    /// Live subscriber count.
    pub fn connections(&self) -> usize {
        self.connections.len()
    }

    /// Apply an inbound diff: merge each entity's fields under `origin`.
    /// Incoming fields are merged whether or not the entity already exists.
    pub fn apply(&self, diff: WireDiff, origin: Origin) {
        for (entity_id, fields) in diff {
            self.store.merge_fields(origin, &entity_id, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> crate::state::Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn hub() -> SyncHub {
        SyncHub::new(Arc::new(WorldStore::new()), 64)
    }

    #[tokio::test]
    async fn subscribe_snapshot_reflects_prior_mutations() {
        let hub = hub();
        hub.store()
            .set(Origin::System, "ball", fields(&[("x", json!(1))]));

        let sub = hub.subscribe();

        assert_eq!(sub.snapshot.len(), 1);
        assert_eq!(sub.snapshot["ball"], fields(&[("x", json!(1))]));
    }

    #[tokio::test]
    async fn concurrent_subscribers_each_get_full_snapshot() {
        let hub = hub();
        hub.store()
            .set(Origin::System, "ball", fields(&[("x", json!(1))]));
        hub.store()
            .set(Origin::System, "paddle", fields(&[("y", json!(2))]));

        let first = hub.subscribe();
        let second = hub.subscribe();

        assert_eq!(first.snapshot.len(), 2);
        assert_eq!(second.snapshot.len(), 2);
        assert_eq!(hub.connections(), 2);
    }

    #[tokio::test]
    async fn mutation_after_subscribe_is_published_with_origin() {
        let hub = hub();
        let mut sub = hub.subscribe();

        let author = Origin::Client(Uuid::new_v4());
        hub.store().merge(author, "ball", "x", json!(5));

        let update = sub.updates.recv().await.unwrap();
        assert_eq!(update.origin, author);
        assert_eq!(update.entity_id, "ball");
        assert_eq!(update.fields, fields(&[("x", json!(5))]));
    }

    #[tokio::test]
    async fn apply_merges_every_entity_in_diff() {
        let hub = hub();
        let mut diff = WireDiff::new();
        diff.insert("ball".to_string(), fields(&[("x", json!(5))]));
        diff.insert("paddle".to_string(), fields(&[("y", json!(9))]));

        hub.apply(diff, Origin::Client(Uuid::new_v4()));

        assert_eq!(hub.store().get("ball"), fields(&[("x", json!(5))]));
        assert_eq!(hub.store().get("paddle"), fields(&[("y", json!(9))]));
    }

    #[tokio::test]
    async fn apply_merges_into_existing_entities() {
        let hub = hub();
        hub.store().set(
            Origin::System,
            "ball",
            fields(&[("x", json!(1)), ("y", json!(2))]),
        );

        let mut diff = WireDiff::new();
        diff.insert("ball".to_string(), fields(&[("x", json!(3))]));
        hub.apply(diff, Origin::Client(Uuid::new_v4()));

        assert_eq!(
            hub.store().get("ball"),
            fields(&[("x", json!(3)), ("y", json!(2))])
        );
    }

    #[tokio::test]
    async fn unsubscribe_shrinks_registry() {
        let hub = hub();
        let sub = hub.subscribe();
        assert_eq!(hub.connections(), 1);

        hub.unsubscribe(sub.id);
        assert_eq!(hub.connections(), 0);

        // Unknown ids are a no-op.
        hub.unsubscribe(Uuid::new_v4());
        assert_eq!(hub.connections(), 0);
    }
}
