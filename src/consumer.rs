//! The single consumer context: owns plot state and feeds the render side.
//!
//! [`PlotConsumer`] is the only writer of the [`Registry`] and its ring buffers. It takes
//! [`PlotEvent`]s off the dispatch bridge strictly in enqueue order, applies them, and
//! forwards the resulting [`RenderUpdate`]s to a [`RenderSink`]. Because there is exactly
//! one writer, none of this state needs a lock.
//!
//! Two drive modes exist:
//! - **frame-driven**: a GUI calls [`PlotConsumer::drain_pending`] once per frame
//! - **task-driven**: headless mode awaits [`PlotConsumer::run`]
//!
//! Malformed or stale input never stops the consumer; it is logged and skipped.

use crate::bridge::EventReceiver;
use crate::config::PlotSettings;
use crate::data::ingest::{IngestStats, Ingestor};
use crate::data::palette::Color;
use crate::data::registry::{
    AxisId, AxisOutcome, Registry, RemovalOutcome, SignalId, SignalOutcome,
};
use crate::error::PlotResult;
use crate::messages::PlotEvent;
use std::future::Future;
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

/// Change notification for the render collaborator.
///
/// Full windows are not pushed; a sink that needs them reads
/// [`Registry::snapshot`] through [`PlotConsumer::registry`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderUpdate {
    AxisAdded {
        axis_id: AxisId,
        title: String,
        x_label: String,
        y_label: String,
        capacity: NonZeroUsize,
    },
    AxisRemoved {
        axis_id: AxisId,
    },
    SignalAdded {
        signal_id: SignalId,
        axis_id: AxisId,
        name: String,
        color: Color,
    },
    SignalRemoved {
        signal_id: SignalId,
    },
    AllCleared,
    /// Signal ids a batch named that are not registered; their points were dropped.
    /// Precedes the batch's `Tails`.
    UnknownSignals(Vec<SignalId>),
    /// New tail value of every live signal after one batch.
    Tails(Vec<(SignalId, f64)>),
}

/// Receives render updates in the order the consumer produced them.
pub trait RenderSink {
    fn render(&mut self, update: RenderUpdate);
}

/// Sink that keeps every update; used by tests and tooling.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub updates: Vec<RenderUpdate>,
}

impl RenderSink for RecordingSink {
    fn render(&mut self, update: RenderUpdate) {
        self.updates.push(update);
    }
}

/// Sink for headless mode: structural changes are logged, tails only counted.
#[derive(Debug, Default)]
pub struct LogSink {
    pub batches_rendered: u64,
}

impl RenderSink for LogSink {
    fn render(&mut self, update: RenderUpdate) {
        match update {
            RenderUpdate::Tails(tails) => {
                self.batches_rendered += 1;
                debug!(signals = tails.len(), "Tails updated");
            }
            RenderUpdate::UnknownSignals(ids) => {
                warn!(signal_ids = ?ids, "Batch named unknown signals");
            }
            other => info!(update = ?other, "Render update"),
        }
    }
}

/// Owns the registry and applies bridge events to it.
pub struct PlotConsumer<S: RenderSink> {
    registry: Registry,
    ingestor: Ingestor,
    sink: S,
    events_applied: u64,
}

impl<S: RenderSink> PlotConsumer<S> {
    pub fn new(registry: Registry, sink: S) -> Self {
        Self {
            registry,
            ingestor: Ingestor::new(),
            sink,
            events_applied: 0,
        }
    }

    /// Builds a consumer around an empty registry using the configured palette and
    /// default window length.
    pub fn from_settings(settings: &PlotSettings, sink: S) -> PlotResult<Self> {
        let registry = Registry::new(settings.palette()?, settings.default_capacity()?)
            .with_max_capacity(settings.max_capacity()?);
        Ok(Self::new(registry, sink))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn ingest_stats(&self) -> IngestStats {
        self.ingestor.stats()
    }

    pub fn events_applied(&self) -> u64 {
        self.events_applied
    }

    /// Applies one event to the registry and forwards what changed to the sink.
    pub fn apply(&mut self, event: PlotEvent) {
        self.events_applied += 1;
        match event {
            PlotEvent::AxisAdded(spec) => {
                let axis_id = spec.id;
                if let AxisOutcome::Created { capacity } = self.registry.add_axis(spec) {
                    if let Some(axis) = self.registry.axis(axis_id) {
                        self.sink.render(RenderUpdate::AxisAdded {
                            axis_id,
                            title: axis.title.clone(),
                            x_label: axis.x_label.clone(),
                            y_label: axis.y_label.clone(),
                            capacity,
                        });
                    }
                }
            }
            PlotEvent::AxisRemoved { axis_id } => {
                if let RemovalOutcome::Removed { cascaded } = self.registry.remove_axis(axis_id) {
                    for signal_id in cascaded {
                        self.sink.render(RenderUpdate::SignalRemoved { signal_id });
                    }
                    self.sink.render(RenderUpdate::AxisRemoved { axis_id });
                }
            }
            PlotEvent::SignalAdded { spec, reply } => {
                let signal_id = spec.signal_id;
                let result = self.registry.add_signal(spec);
                if let Ok(SignalOutcome::Created { color, .. }) = &result {
                    if let Some(signal) = self.registry.signal(signal_id) {
                        self.sink.render(RenderUpdate::SignalAdded {
                            signal_id,
                            axis_id: signal.axis_id,
                            name: signal.name.clone(),
                            color: *color,
                        });
                    }
                }
                if let Some(reply) = reply {
                    if reply.send(result).is_err() {
                        debug!(signal_id, "AddSignal caller went away before the reply");
                    }
                }
            }
            PlotEvent::SignalRemoved { signal_id } => {
                if let RemovalOutcome::Removed { .. } = self.registry.remove_signal(signal_id) {
                    self.sink.render(RenderUpdate::SignalRemoved { signal_id });
                }
            }
            PlotEvent::AllCleared => {
                self.registry.clear_all();
                self.sink.render(RenderUpdate::AllCleared);
            }
            PlotEvent::BatchReceived(batch) => {
                let report = self.ingestor.apply(&mut self.registry, &batch);
                if !report.unknown.is_empty() {
                    self.sink.render(RenderUpdate::UnknownSignals(report.unknown));
                }
                self.sink.render(RenderUpdate::Tails(report.tails));
            }
        }
    }

    /// Applies up to `max` queued events without waiting. Returns how many were applied.
    pub fn drain_pending(&mut self, events: &mut EventReceiver, max: usize) -> usize {
        let mut applied = 0;
        while applied < max {
            let Some(event) = events.try_recv() else {
                break;
            };
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Stops the bridge and applies everything still queued. Best effort: events that
    /// producers had not yet enqueued are lost.
    pub fn shutdown(&mut self, events: &mut EventReceiver) -> usize {
        events.close();
        let drained = self.drain_pending(events, usize::MAX);
        info!(
            drained,
            total = self.events_applied,
            "Plot consumer drained remaining events"
        );
        drained
    }

    /// Applies events as they arrive until every publisher is gone or `shutdown` resolves.
    ///
    /// On shutdown the bridge is closed and whatever is still queued is applied before
    /// returning, so every call that was acknowledged to a producer is reflected in the
    /// returned consumer.
    pub async fn run<F>(mut self, mut events: EventReceiver, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    self.shutdown(&mut events);
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        warn!("All event publishers dropped, plot consumer stopping");
                        break;
                    }
                },
            }
        }
        self
    }
}
