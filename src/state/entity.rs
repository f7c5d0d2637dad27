use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// An entity's record: field name → JSON value.
///
/// Absent entities are logically an empty record; reads never fail.
pub type Fields = HashMap<String, Value>;

/// Full snapshot of the world: entity id → record.
pub type World = HashMap<String, Fields>;

/// Identity a mutation is attributed to.
///
/// `System` covers mutations no connection authored (the HTTP interface,
/// administrative clears). It never equals a client identity, so
/// system-originated updates reach every subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    System,
    Client(Uuid),
}

/// A committed mutation awaiting fan-out to subscribers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldUpdate {
    pub origin: Origin,
    pub entity_id: String,

    /// The entity's full record as of this mutation.
    pub fields: Fields,

    pub timestamp: DateTime<Utc>,
}
