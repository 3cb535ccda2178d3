// SPDX-License-Identifier: MIT OR Apache-2.0

mod common;

use common::init_logging;
use eventflux_elements::core::config::FlatConfig;
use eventflux_elements::core::element::{Element, ProcessorHost};
use eventflux_elements::core::event::Event;
use eventflux_elements::core::processor::{TaskDuration, TaskDurationParameters};
use eventflux_elements::core::stream::CollectingCollector;
use serde_json::json;

const CONFIG: &str = r#"
[elements.machine-states]
task.field = "s0::machine::state"
task.timestamp-field = "s0::timestamp"
task.output-unit = "seconds"
"#;

fn machine_event(state: &str, timestamp: i64) -> Event {
    Event::from_json(&json!({
        "machine": { "id": "press-4", "state": state },
        "timestamp": timestamp,
    }))
    .unwrap()
}

fn host(out: &CollectingCollector) -> ProcessorHost<TaskDuration> {
    let config = FlatConfig::from_toml_str(CONFIG, "machine-states").unwrap();
    ProcessorHost::new(
        "machine-states",
        TaskDuration::new(),
        TaskDurationParameters::from_flat_config(&config).unwrap(),
        Box::new(out.clone()),
    )
}

#[test]
fn test_nested_key_transitions_in_seconds() {
    init_logging();
    let out = CollectingCollector::new();
    let mut host = host(&out);
    host.start().unwrap();

    for (state, ts) in [
        ("idle", 0),
        ("idle", 4_000),
        ("running", 10_000),
        ("running", 70_000),
        ("idle", 100_000),
    ] {
        host.on_event(machine_event(state, ts)).unwrap();
    }
    host.stop().unwrap();

    let produced: Vec<_> = out
        .snapshot()
        .iter()
        .map(|e| e.to_json().unwrap())
        .collect();
    assert_eq!(
        produced,
        vec![
            json!({"processId": "idle-running", "duration": 10.0}),
            json!({"processId": "running-idle", "duration": 90.0}),
        ]
    );
}

#[test]
fn test_single_key_stream_emits_nothing() {
    let out = CollectingCollector::new();
    let mut host = host(&out);
    host.start().unwrap();

    for ts in [0, 10, 20, 30] {
        host.on_event(machine_event("idle", ts)).unwrap();
    }

    assert!(out.is_empty());
}

#[test]
fn test_event_without_key_is_dropped_without_touching_state() {
    init_logging();
    let out = CollectingCollector::new();
    let mut host = host(&out);
    host.start().unwrap();

    host.on_event(machine_event("idle", 0)).unwrap();
    host.on_event(Event::from_json(&json!({"timestamp": 5_000})).unwrap())
        .unwrap();
    host.on_event(machine_event("running", 2_000)).unwrap();

    assert_eq!(host.stats().events_dropped, 1);
    assert_eq!(
        out.snapshot()[0].to_json().unwrap(),
        json!({"processId": "idle-running", "duration": 2.0})
    );
}

#[test]
fn test_fresh_host_starts_without_history() {
    let out = CollectingCollector::new();

    let mut first = host(&out);
    first.start().unwrap();
    first.on_event(machine_event("idle", 0)).unwrap();
    first.stop().unwrap();

    let mut second = host(&out);
    second.start().unwrap();
    second.on_event(machine_event("running", 1_000)).unwrap();
    second.on_event(machine_event("idle", 3_000)).unwrap();
    second.stop().unwrap();

    assert_eq!(
        out.snapshot()[0].to_json().unwrap(),
        json!({"processId": "running-idle", "duration": 2.0})
    );
    assert_eq!(out.len(), 1);
}
