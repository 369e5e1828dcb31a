//! Pluggable event sinks.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::events::{EventKind, SimulationEvent};

/// Event consumer.
pub trait EventSink: Send {
    fn handle(&mut self, event: &SimulationEvent);

    /// Called once at the end of a run.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Shared handle onto the events collected by a [`VecSink`].
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl EventLog {
    /// Copy of everything collected so far.
    pub fn snapshot(&self) -> Vec<SimulationEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of events whose label matches.
    pub fn count(&self, label: &str) -> usize {
        self.snapshot().iter().filter(|e| e.label() == label).count()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects events in memory; read them back through its [`EventLog`].
#[derive(Debug, Default)]
pub struct VecSink {
    log: EventLog,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays readable after the sink is moved into a bus.
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        let mut guard = match self.log.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        match &event.kind {
            EventKind::Timestep { dt, bound } => {
                tracing::debug!(step = event.step, dt, bound = %bound, "timestep");
            }
            EventKind::Checkpoint { id, time, swarm } => {
                tracing::info!(step = event.step, id, time, swarm, "checkpoint");
            }
            EventKind::Solve { iterations, residual, converged, .. } if !converged => {
                tracing::warn!(step = event.step, iterations, residual, "solve did not converge");
            }
            kind => tracing::trace!(step = event.step, event = ?kind, "simulation_event"),
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

/// Writes one JSON object per event.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn handle(&mut self, event: &SimulationEvent) {
        match serde_json::to_string(event) {
            Ok(line) => {
                if let Err(e) = writeln!(self.writer, "{line}") {
                    tracing::warn!(error = %e, "event log write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "event encode failed"),
        }
    }

    fn finalize(&mut self) {
        let _ = self.writer.flush();
    }

    fn name(&self) -> &str {
        "json_lines_sink"
    }
}
