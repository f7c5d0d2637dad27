use crate::bus::EventBus;
use crate::state::entity::{Fields, Origin, World};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

/// Authoritative world store.
///
/// Entities live in a sharded concurrent map, so mutations to different
/// entities do not contend. Every mutation targets a single entity and is
/// applied under that entity's entry guard; the change notification fires
/// while the guard is still held, so per-entity notification order equals
/// commit order. Listeners must not call back into the store.
pub struct WorldStore {
    entities: DashMap<String, Fields>,
    bus: EventBus,
}

impl WorldStore {
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
            bus: EventBus::new(),
        }
    }

    /// Listener registration point for this store's mutations.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Current record for `id`, or an empty record if absent. Never fails.
    pub fn get(&self, id: &str) -> Fields {
        self.entities
            .get(id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// Replace `id` wholesale with `fields`, dropping fields not present in
    /// the new record. Fires one notification carrying the new full record.
    /// Returns the resulting record.
    pub fn set(&self, origin: Origin, id: &str, fields: Fields) -> Fields {
        let mut entry = self.entities.entry(id.to_string()).or_default();
        *entry = fields;
        let record = entry.clone();
        self.bus.notify(origin, id, &record);
        record
    }

    /// Set one field within `id`'s record, creating the record if absent.
    /// Fires one notification carrying the record after the merge.
    pub fn merge(&self, origin: Origin, id: &str, field: &str, value: Value) {
        let mut entry = self.entities.entry(id.to_string()).or_default();
        entry.insert(field.to_string(), value);
        let record = entry.clone();
        self.bus.notify(origin, id, &record);
    }

    /// Merge a batch of fields into `id`'s record under one entry guard, so
    /// no reader observes a partially-applied batch.
    ///
    /// Fires one notification per field, in the batch's iteration order,
    /// each carrying the record as of that field's application. Returns
    /// whether this call created the entity.
    pub fn merge_fields(&self, origin: Origin, id: &str, fields: Fields) -> bool {
        let (created, mut entry) = match self.entities.entry(id.to_string()) {
            Entry::Occupied(entry) => (false, entry.into_ref()),
            Entry::Vacant(entry) => (true, entry.insert(Fields::new())),
        };
        for (field, value) in fields {
            entry.insert(field, value);
            let record = entry.clone();
            self.bus.notify(origin, id, &record);
        }
        created
    }

    /// Discard the entire world. Fires no per-entity notifications.
    pub fn clear(&self) {
        self.entities.clear();
    }

    /// Full copy of the world for bulk consumers.
    pub fn snapshot(&self) -> World {
        self.entities
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of entities currently in the world.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for WorldStore {
    fn default() -> Self {
        Self::new()
    }
}
