//! Batch ingestion with synchronized scrolling.
//!
//! Every batch advances **every** registered signal exactly once, not just the signals the
//! batch mentions. Signals without a sample in the batch receive `0.0`, so all series on
//! screen stay time-aligned even when producers sample at different or bursty rates.
//!
//! ```text
//! batch {10: 5.0}          buffer(10): [.., 4.0] -> [.., 4.0, 5.0]
//! registered: 10, 11       buffer(11): [.., 2.0] -> [.., 2.0, 0.0]
//! ```
//!
//! Registry membership is checked when the batch is applied, never when it was received,
//! so a signal removed while a batch sat in the queue is simply unknown by then.

use crate::data::registry::{Registry, SignalId};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace, warn};

/// A single sample addressed to one signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub signal_id: SignalId,
    pub value: f64,
}

/// Samples submitted together by a producer. A repeated signal id means last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub points: Vec<SamplePoint>,
}

impl Batch {
    pub fn new(points: Vec<SamplePoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(SignalId, f64)> for Batch {
    fn from_iter<I: IntoIterator<Item = (SignalId, f64)>>(iter: I) -> Self {
        Self {
            points: iter
                .into_iter()
                .map(|(signal_id, value)| SamplePoint { signal_id, value })
                .collect(),
        }
    }
}

/// What one batch did to the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// New tail value of every live signal, ascending by id.
    pub tails: Vec<(SignalId, f64)>,
    /// Signal ids named by the batch that are not registered; their points were dropped.
    pub unknown: Vec<SignalId>,
}

/// Running totals kept by the [`Ingestor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub batches: u64,
    pub points: u64,
    pub dropped_points: u64,
}

/// Applies batches to a [`Registry`].
#[derive(Debug, Default)]
pub struct Ingestor {
    stats: IngestStats,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Advances every registered signal once and reports the new tails.
    pub fn apply(&mut self, registry: &mut Registry, batch: &Batch) -> IngestReport {
        let mut updates: HashMap<SignalId, f64> = HashMap::with_capacity(batch.points.len());
        for point in &batch.points {
            updates.insert(point.signal_id, point.value);
        }

        let unknown: BTreeSet<SignalId> = updates
            .keys()
            .copied()
            .filter(|id| !registry.contains_signal(*id))
            .collect();
        for signal_id in &unknown {
            warn!(signal_id, "Received point for unknown signal, dropping");
        }
        let dropped = batch
            .points
            .iter()
            .filter(|p| unknown.contains(&p.signal_id))
            .count() as u64;

        let tails: Vec<(SignalId, f64)> = registry
            .signals_mut()
            .map(|signal| {
                let id = signal.id;
                let buffer = signal.buffer_mut();
                buffer.advance(updates.get(&id).copied());
                (id, buffer.tail())
            })
            .collect();

        self.stats.batches += 1;
        self.stats.points += batch.points.len() as u64;
        self.stats.dropped_points += dropped;
        trace!(
            points = batch.points.len(),
            advanced = tails.len(),
            dropped,
            "Applied batch"
        );
        if self.stats.batches % 10_000 == 0 {
            debug!(stats = ?self.stats, "Ingestion totals");
        }

        IngestReport {
            tails,
            unknown: unknown.into_iter().collect(),
        }
    }
}
