use crate::state::{Fields, WorldUpdate};
use std::collections::HashMap;

/// Wire shape shared by both directions of the subscribe channel: a JSON
/// object mapping entity identifiers to field records.
pub type WireDiff = HashMap<String, Fields>;

/// Encode one committed update as a single-entity wire object.
pub fn encode_update(update: &WorldUpdate) -> serde_json::Result<String> {
    let mut diff = WireDiff::with_capacity(1);
    diff.insert(update.entity_id.clone(), update.fields.clone());
    serde_json::to_string(&diff)
}

/// Decode an inbound text frame. Anything but an object of field records is
/// an error; callers log and skip the frame.
pub fn decode_diff(text: &str) -> serde_json::Result<WireDiff> {
    serde_json::from_str(text)
}
