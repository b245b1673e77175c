//! Integration tests for tracing and event monitoring.
//!
//! The trace callback is process-wide, so every test here is `#[serial]` and
//! only looks at events of its own registry.

mod common;

use common::{block, vanilla, BlockHandler, Blocks};
use id_registry::{clear_trace_callback, set_trace_callback, IdMap, Registry, RegistryEvent};
use serial_test::serial;
use std::sync::{Arc, Mutex};

fn capture(registry: &'static str) -> Arc<Mutex<Vec<String>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    set_trace_callback(move |event| {
        if event.registry() == registry {
            events_clone.lock().unwrap().push(event.to_string());
        }
    });
    events
}

#[test]
#[serial]
fn test_register_and_unregister_events() {
    let events = capture("traced_blocks");

    let mut reg: Blocks = Registry::new("traced_blocks", BlockHandler::small());
    reg.register("a", block(1)).unwrap();
    reg.unregister("a");
    let _ = reg.get("a");

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "traced_blocks: register { name: a, id: 100 }",
            "traced_blocks: unregister { name: a, id: 100 }",
        ]
    );

    clear_trace_callback();
}

#[test]
#[serial]
fn test_rebind_event() {
    let events = capture("rebind_blocks");

    let mut reg: Blocks = Registry::new("rebind_blocks", BlockHandler::small());
    reg.register_vanilla("old_stone", vanilla(1, 1)).unwrap();
    reg.register_vanilla("stone", vanilla(1, 1)).unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "rebind_blocks: register_vanilla { name: old_stone, id: 1 }",
            "rebind_blocks: rebind { id: 1, previous: old_stone, name: stone }",
            "rebind_blocks: register_vanilla { name: stone, id: 1 }",
        ]
    );
    assert!(!reg.contains_key("old_stone"));

    clear_trace_callback();
}

#[test]
#[serial]
fn test_phase_events() {
    let events = capture("phase_blocks");

    let mut reg: Blocks = Registry::new("phase_blocks", BlockHandler::small());
    reg.run_init().unwrap();
    reg.run_apply().unwrap();

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![
            "phase_blocks: init started",
            "phase_blocks: init finished",
            "phase_blocks: apply started",
            "phase_blocks: apply finished",
        ]
    );

    clear_trace_callback();
}

#[test]
#[serial]
fn test_persistence_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    set_trace_callback(move |event| {
        if event.registry() == "persisted_blocks" {
            events_clone.lock().unwrap().push(event.clone());
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let mut reg: Blocks = Registry::new("persisted_blocks", BlockHandler::small());
    reg.register("a", block(1)).unwrap();
    reg.save(dir.path()).wait();
    reg.load(dir.path());

    std::fs::write(reg.file_path(dir.path()), b"junk").unwrap();
    reg.load(dir.path());

    let captured = events.lock().unwrap();
    assert_eq!(
        captured[1..],
        [
            RegistryEvent::Saved {
                registry: "persisted_blocks".into(),
                count: 1
            },
            RegistryEvent::Loaded {
                registry: "persisted_blocks".into(),
                count: 1
            },
            RegistryEvent::Reset {
                registry: "persisted_blocks".into()
            },
        ]
    );

    clear_trace_callback();
}

#[test]
#[serial]
fn test_rebind_replaces_persisted_binding() {
    let events = capture("drift_blocks");

    let mut reg: Blocks = Registry::new("drift_blocks", BlockHandler::small());
    let dir = tempfile::tempdir().unwrap();
    let mut ids = IdMap::new();
    ids.insert("renamed", 3).unwrap();
    std::fs::write(reg.file_path(dir.path()), id_registry::encode(&ids)).unwrap();
    reg.load(dir.path());

    reg.register_vanilla("original", vanilla(3, 1)).unwrap();

    let captured = events.lock().unwrap();
    assert!(captured
        .iter()
        .any(|e| e == "drift_blocks: rebind { id: 3, previous: renamed, name: original }"));

    clear_trace_callback();
}

#[test]
#[serial]
fn test_clear_trace_callback() {
    let events = capture("quiet_blocks");
    clear_trace_callback();

    let mut reg: Blocks = Registry::new("quiet_blocks", BlockHandler::small());
    reg.register("a", block(1)).unwrap();

    assert!(events.lock().unwrap().is_empty());
}
