//! Integration tests for lithos-telemetry.

use lithos_telemetry::{EventBus, EventKind, EventSink, JsonLinesSink, SimulationEvent, VecSink};

// ─── Step Delivery ────────────────────────────────────────────

#[test]
fn events_reach_sinks_when_the_step_closes() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut bus = EventBus::with_sink(Box::new(sink));

    bus.emit(SimulationEvent::new(0, EventKind::StepBegin { time: 0.0 }));
    bus.emit(SimulationEvent::new(0, EventKind::Timestep { dt: 1.0, bound: "run_end".into() }));
    assert!(log.is_empty(), "nothing is delivered mid-step");
    assert_eq!(bus.pending(), 2);

    assert_eq!(bus.end_step(1, 1.0, 1.0, 0.001), 3);
    assert_eq!(bus.pending(), 0);
    assert_eq!(bus.last_closed_step(), Some(1));
    let events = log.snapshot();
    let labels: Vec<&str> = events.iter().map(|e| e.label()).collect();
    assert_eq!(labels, vec!["step_begin", "timestep", "step_end"]);
    assert_eq!(events[2].step, 1);
}

#[test]
fn closing_a_step_twice_delivers_nothing() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut bus = EventBus::with_sink(Box::new(sink));
    bus.end_step(2, 2.0, 1.0, 0.0);

    bus.emit(SimulationEvent::new(2, EventKind::Checkpoint { id: 1, time: 2.0, swarm: false }));
    assert_eq!(bus.end_step(2, 2.0, 1.0, 0.0), 0);
    assert_eq!(bus.end_step(1, 1.0, 1.0, 0.0), 0);
    assert_eq!(log.count("checkpoint"), 0);
    assert_eq!(bus.pending(), 1);

    bus.end_step(3, 3.0, 1.0, 0.0);
    assert_eq!(log.count("checkpoint"), 1);
    assert_eq!(log.count("step_end"), 2);
}

#[test]
fn end_run_delivers_events_between_steps() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut bus = EventBus::with_sink(Box::new(sink));
    bus.end_step(4, 4.0, 1.0, 0.0);
    bus.emit(SimulationEvent::new(2, EventKind::Restart { checkpoint: 2, time: 2.0 }));
    bus.end_run();
    assert_eq!(log.count("restart"), 1);
    assert_eq!(bus.last_closed_step(), None);

    // Numbering may go back after a restart.
    assert_eq!(bus.end_step(3, 3.0, 1.0, 0.0), 1);
}

#[test]
fn disabled_bus_drops_events() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut bus = EventBus::with_sink(Box::new(sink));
    bus.set_enabled(false);
    bus.emit(SimulationEvent::new(0, EventKind::StepBegin { time: 0.0 }));
    assert_eq!(bus.end_step(1, 1.0, 1.0, 0.0), 0);
    assert_eq!(bus.pending(), 0);
    assert!(log.is_empty());
}

#[test]
fn multiple_sinks_each_receive() {
    let a = VecSink::new();
    let b = VecSink::new();
    let (la, lb) = (a.log(), b.log());
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(a));
    bus.add_sink(Box::new(b));
    assert_eq!(bus.sink_count(), 2);
    bus.emit(SimulationEvent::new(3, EventKind::Checkpoint { id: 1, time: 10.0, swarm: true }));
    bus.end_run();
    assert_eq!(la.count("checkpoint"), 1);
    assert_eq!(lb.count("checkpoint"), 1);
}

// ─── Serialization ────────────────────────────────────────────

#[test]
fn event_serialization() {
    let event = SimulationEvent::new(5, EventKind::Timestep { dt: 0.25, bound: "cfl".into() });
    let json = serde_json::to_string(&event).unwrap();
    let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
}

#[test]
fn json_lines_sink_writes_one_line_per_event() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.handle(&SimulationEvent::new(1, EventKind::Restart { checkpoint: 4, time: 2.0 }));
    sink.handle(&SimulationEvent::new(2, EventKind::StepBegin { time: 2.0 }));
    sink.finalize();
    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("Restart"));
}
