//! Event bus with per-step delivery.
//!
//! Events raised while a model iteration is in flight (solve convergence,
//! the selected timestep, checkpoints) are queued and reach the sinks
//! together when the iteration closes with [`EventBus::end_step`]. Sinks
//! therefore always observe whole iterations: a step's `step_end` is the
//! last event they see for it. Events raised between iterations, such as
//! the initial checkpoint or a restart, ride along with the next closed
//! step or are delivered by [`EventBus::end_run`].

use std::cell::Cell;
use std::sync::mpsc;

use crate::events::{EventKind, SimulationEvent};
use crate::sinks::EventSink;

/// Telemetry bus owned by a model.
pub struct EventBus {
    sender: mpsc::Sender<SimulationEvent>,
    receiver: mpsc::Receiver<SimulationEvent>,
    sinks: Vec<Box<dyn EventSink>>,
    /// Disabled bus drops events.
    enabled: bool,
    pending: Cell<usize>,
    /// Last step closed with `end_step`.
    last_closed: Option<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver, sinks: Vec::new(), enabled: true, pending: Cell::new(0), last_closed: None }
    }

    /// Bus with a single sink.
    pub fn with_sink(sink: Box<dyn EventSink>) -> Self {
        let mut bus = Self::new();
        bus.add_sink(sink);
        bus
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queues an event for the current step. No-op on a disabled bus.
    pub fn emit(&self, event: SimulationEvent) {
        if !self.enabled {
            return;
        }
        // The receiver lives as long as the bus.
        if self.sender.send(event).is_ok() {
            self.pending.set(self.pending.get() + 1);
        }
    }

    /// Events queued but not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Step most recently closed, if any.
    pub fn last_closed_step(&self) -> Option<u64> {
        self.last_closed
    }

    /// Closes model step `step`: queues its `step_end` and delivers every
    /// pending event in emission order. Returns the number delivered.
    ///
    /// Closing the same step twice, or an earlier one, is ignored apart
    /// from a warning; the queue stays put until a later step closes.
    pub fn end_step(&mut self, step: u64, time: f64, dt: f64, wall_time: f64) -> usize {
        if self.last_closed.is_some_and(|last| step <= last) {
            tracing::warn!(step, last = ?self.last_closed, "step already closed");
            return 0;
        }
        self.emit(SimulationEvent::new(step, EventKind::StepEnd { time, dt, wall_time }));
        self.last_closed = Some(step);
        self.deliver()
    }

    /// Delivers anything left over from between iterations and lets every
    /// sink flush its output. The bus stays usable for a later run, whose
    /// step numbering may restart lower after a restart.
    pub fn end_run(&mut self) {
        self.deliver();
        self.last_closed = None;
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    fn deliver(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.receiver.try_recv() {
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
            delivered += 1;
        }
        self.pending.set(0);
        delivered
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("enabled", &self.enabled)
            .field("pending", &self.pending.get())
            .field("last_closed", &self.last_closed)
            .finish()
    }
}
