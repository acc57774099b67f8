//! Authoritative map of plot axes and signals.
//!
//! The [`Registry`] is owned by the single consumer context (see [`crate::consumer`]) and is
//! never shared between threads, so it needs no locking. Producers only ever describe the
//! changes they want as [`crate::messages::PlotEvent`] values.
//!
//! # Invariants
//!
//! - every signal's `axis_id` names a live axis
//! - signal ids are unique across the whole registry, not just per axis
//! - axis ids are unique
//! - a signal's ring buffer has exactly its axis's capacity for its whole lifetime
//!
//! Tolerant operations report what happened through outcome enums instead of errors:
//! duplicates are [`AxisOutcome::AlreadyExists`] / [`SignalOutcome::AlreadyExists`] and
//! removing an unknown id is [`RemovalOutcome::NotFound`]. The only hard failure is adding a
//! signal to a missing axis, which returns [`PlotError::AxisNotFound`].

use crate::data::palette::{Color, Palette};
use crate::data::ring_buffer::RingBuffer;
use crate::error::{PlotError, PlotResult};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use tracing::{info, warn};

/// Caller-assigned axis identifier.
pub type AxisId = i32;

/// Caller-assigned signal identifier, unique across all axes.
pub type SignalId = i32;

/// Capacity used when an axis is registered with a non-positive sample count.
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Largest window an axis may request; larger requests are clamped to it.
pub const DEFAULT_MAX_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100_000) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Requested axis configuration, as received from a producer.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub id: AxisId,
    /// Requested window length; zero or negative selects the registry default.
    pub samples: i64,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// Requested signal configuration, as received from a producer.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub axis_id: AxisId,
    pub signal_id: SignalId,
    pub name: String,
    /// Optional color token; missing or unparsable tokens get a palette color.
    pub color: Option<String>,
}

/// A plot context with a fixed sample window.
#[derive(Debug, Clone)]
pub struct Axis {
    pub id: AxisId,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub capacity: NonZeroUsize,
    signals: BTreeSet<SignalId>,
}

impl Axis {
    /// Ids of the signals drawn on this axis, ascending.
    pub fn signal_ids(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.signals.iter().copied()
    }
}

/// One time series attached to exactly one axis.
#[derive(Debug, Clone)]
pub struct Signal {
    pub id: SignalId,
    pub axis_id: AxisId,
    pub name: String,
    pub color: Color,
    buffer: RingBuffer,
}

impl Signal {
    /// The signal's sample window.
    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut RingBuffer {
        &mut self.buffer
    }
}

/// Result of [`Registry::add_axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOutcome {
    Created { capacity: NonZeroUsize },
    AlreadyExists,
}

/// Result of a successful [`Registry::add_signal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// `color_fallback` is set when the requested color was missing or invalid.
    Created { color: Color, color_fallback: bool },
    AlreadyExists,
}

/// Result of removing an axis or a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// `cascaded` lists signals removed along with an axis; empty for signal removal.
    Removed { cascaded: Vec<SignalId> },
    NotFound,
}

/// Counts reported by [`Registry::clear_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cleared {
    pub axes: usize,
    pub signals: usize,
}

/// Axes, signals and their buffers.
#[derive(Debug, Clone)]
pub struct Registry {
    axes: BTreeMap<AxisId, Axis>,
    signals: BTreeMap<SignalId, Signal>,
    palette: Palette,
    default_capacity: NonZeroUsize,
    max_capacity: NonZeroUsize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Palette::default(), DEFAULT_CAPACITY)
    }
}

impl Registry {
    /// Creates an empty registry with an injected palette.
    pub fn new(palette: Palette, default_capacity: NonZeroUsize) -> Self {
        Self {
            axes: BTreeMap::new(),
            signals: BTreeMap::new(),
            palette,
            default_capacity: default_capacity.min(DEFAULT_MAX_CAPACITY),
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }

    /// Sets the largest window an axis may request. The default capacity is lowered to it
    /// if needed.
    pub fn with_max_capacity(mut self, max_capacity: NonZeroUsize) -> Self {
        self.max_capacity = max_capacity;
        self.default_capacity = self.default_capacity.min(max_capacity);
        self
    }

    pub fn max_capacity(&self) -> NonZeroUsize {
        self.max_capacity
    }

    /// Registers an axis. A duplicate id is a logged no-op.
    pub fn add_axis(&mut self, spec: AxisSpec) -> AxisOutcome {
        if self.axes.contains_key(&spec.id) {
            warn!(axis_id = spec.id, "Axis already exists, ignoring");
            return AxisOutcome::AlreadyExists;
        }

        let capacity = usize::try_from(spec.samples)
            .ok()
            .and_then(NonZeroUsize::new)
            .unwrap_or(self.default_capacity);
        if capacity > self.max_capacity {
            warn!(
                axis_id = spec.id,
                requested = spec.samples,
                max = self.max_capacity.get(),
                "Requested window too large, clamping"
            );
        }
        let capacity = capacity.min(self.max_capacity);

        info!(axis_id = spec.id, title = %spec.title, capacity = capacity.get(), "Adding axis");
        self.axes.insert(
            spec.id,
            Axis {
                id: spec.id,
                title: spec.title,
                x_label: spec.x_label,
                y_label: spec.y_label,
                capacity,
                signals: BTreeSet::new(),
            },
        );
        AxisOutcome::Created { capacity }
    }

    /// Removes an axis together with all of its signals.
    pub fn remove_axis(&mut self, axis_id: AxisId) -> RemovalOutcome {
        let Some(axis) = self.axes.remove(&axis_id) else {
            warn!(axis_id, "Tried to remove non-existent axis");
            return RemovalOutcome::NotFound;
        };

        let cascaded: Vec<SignalId> = axis.signals.into_iter().collect();
        for signal_id in &cascaded {
            self.signals.remove(signal_id);
        }
        info!(axis_id, signals = cascaded.len(), "Removed axis");
        RemovalOutcome::Removed { cascaded }
    }

    /// Attaches a new signal to an existing axis.
    ///
    /// Fails with [`PlotError::AxisNotFound`] when the axis is missing. A signal id that is
    /// already registered anywhere is a logged no-op.
    pub fn add_signal(&mut self, spec: SignalSpec) -> PlotResult<SignalOutcome> {
        let Some(axis) = self.axes.get_mut(&spec.axis_id) else {
            warn!(
                axis_id = spec.axis_id,
                signal_id = spec.signal_id,
                "Cannot add signal to non-existent axis"
            );
            return Err(PlotError::AxisNotFound(spec.axis_id));
        };

        if self.signals.contains_key(&spec.signal_id) {
            warn!(signal_id = spec.signal_id, "Signal already exists, ignoring");
            return Ok(SignalOutcome::AlreadyExists);
        }

        let requested = spec.color.as_deref().filter(|c| !c.trim().is_empty());
        let (color, color_fallback) = match requested.map(Color::parse) {
            Some(Ok(color)) => (color, false),
            Some(Err(err)) => {
                warn!(signal_id = spec.signal_id, %err, "Using palette color instead");
                (self.palette.next(), true)
            }
            None => (self.palette.next(), true),
        };

        let name = if spec.name.is_empty() {
            format!("Signal {}", spec.signal_id)
        } else {
            spec.name
        };

        info!(
            axis_id = spec.axis_id,
            signal_id = spec.signal_id,
            %name,
            %color,
            "Adding signal"
        );
        axis.signals.insert(spec.signal_id);
        self.signals.insert(
            spec.signal_id,
            Signal {
                id: spec.signal_id,
                axis_id: spec.axis_id,
                name,
                color,
                buffer: RingBuffer::new(axis.capacity),
            },
        );
        Ok(SignalOutcome::Created {
            color,
            color_fallback,
        })
    }

    /// Detaches a signal from its axis and drops its buffer.
    pub fn remove_signal(&mut self, signal_id: SignalId) -> RemovalOutcome {
        let Some(signal) = self.signals.remove(&signal_id) else {
            warn!(signal_id, "Tried to remove non-existent signal");
            return RemovalOutcome::NotFound;
        };
        if let Some(axis) = self.axes.get_mut(&signal.axis_id) {
            axis.signals.remove(&signal_id);
        }
        info!(signal_id, axis_id = signal.axis_id, "Removed signal");
        RemovalOutcome::Removed {
            cascaded: Vec::new(),
        }
    }

    /// Drops every axis and signal and rewinds the palette.
    pub fn clear_all(&mut self) -> Cleared {
        let cleared = Cleared {
            axes: self.axes.len(),
            signals: self.signals.len(),
        };
        self.axes.clear();
        self.signals.clear();
        self.palette.reset();
        info!(axes = cleared.axes, signals = cleared.signals, "Cleared all plots");
        cleared
    }

    pub fn axis(&self, axis_id: AxisId) -> Option<&Axis> {
        self.axes.get(&axis_id)
    }

    pub fn signal(&self, signal_id: SignalId) -> Option<&Signal> {
        self.signals.get(&signal_id)
    }

    pub fn contains_signal(&self, signal_id: SignalId) -> bool {
        self.signals.contains_key(&signal_id)
    }

    /// Axes in ascending id order.
    pub fn axes(&self) -> impl Iterator<Item = &Axis> {
        self.axes.values()
    }

    /// Signals in ascending id order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    pub(crate) fn signals_mut(&mut self) -> impl Iterator<Item = &mut Signal> {
        self.signals.values_mut()
    }

    /// Signals drawn on `axis_id`, ascending. Empty for an unknown axis.
    pub fn signals_on(&self, axis_id: AxisId) -> impl Iterator<Item = &Signal> {
        self.axes
            .get(&axis_id)
            .into_iter()
            .flat_map(|axis| axis.signals.iter())
            .filter_map(|id| self.signals.get(id))
    }

    /// Oldest→newest copy of a signal's window.
    pub fn snapshot(&self, signal_id: SignalId) -> Option<Vec<f64>> {
        self.signals.get(&signal_id).map(|s| s.buffer.snapshot())
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.signals.is_empty()
    }
}
