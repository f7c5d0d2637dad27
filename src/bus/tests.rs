use super::*;
use crate::state::Origin;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn tagging_listener(log: Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Listener {
    Box::new(move |_origin, _entity_id, _fields| {
        log.lock().unwrap().push(tag);
    })
}

#[test]
fn listeners_run_in_registration_order() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.register(tagging_listener(Arc::clone(&log), "first"));
    bus.register(tagging_listener(Arc::clone(&log), "second"));
    bus.register(tagging_listener(Arc::clone(&log), "third"));

    bus.notify(Origin::System, "ball", &HashMap::new());

    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn panicking_listener_does_not_stop_later_listeners() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.register(tagging_listener(Arc::clone(&log), "before"));
    bus.register(Box::new(|_, _, _| panic!("listener blew up")));
    bus.register(tagging_listener(Arc::clone(&log), "after"));

    bus.notify(Origin::System, "ball", &HashMap::new());

    assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
}

#[test]
fn notify_survives_repeated_listener_panics() {
    let bus = EventBus::new();
    bus.register(Box::new(|_, _, _| panic!("always")));

    bus.notify(Origin::System, "a", &HashMap::new());
    bus.notify(Origin::System, "b", &HashMap::new());
}

#[test]
fn unregistered_listener_no_longer_runs() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.register(tagging_listener(Arc::clone(&log), "keep"));
    let removed = bus.register(tagging_listener(Arc::clone(&log), "remove"));
    bus.unregister(removed);

    bus.notify(Origin::System, "ball", &HashMap::new());

    assert_eq!(*log.lock().unwrap(), vec!["keep"]);
    // Unregistering twice is a no-op.
    bus.unregister(removed);
}

#[test]
fn listener_sees_origin_and_record() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);

    bus.register(Box::new(move |origin, entity_id, fields| {
        *sink.lock().unwrap() = Some((origin, entity_id.to_string(), fields.clone()));
    }));

    let mut fields = HashMap::new();
    fields.insert("x".to_string(), serde_json::json!(5));
    bus.notify(Origin::System, "ball", &fields);

    let (origin, entity_id, record) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(origin, Origin::System);
    assert_eq!(entity_id, "ball");
    assert_eq!(record.get("x").unwrap(), &serde_json::json!(5));
}
