//! Event values carried by the dispatch bridge.
//!
//! This module defines what producers (gRPC workers) hand to the single plot consumer
//! through [`crate::bridge`]. Events are plain owned values; the consumer is the only
//! place where they turn into registry mutations.
//!
//! # Message Flow
//!
//! ```text
//! gRPC worker                         Consumer (GUI thread or headless task)
//! -----------                         --------------------------------------
//! 1. Build PlotEvent
//! 2. publish() onto bridge   ------>
//!                                     3. Dequeue in enqueue order
//!                                     4. Apply to Registry / Ingestor
//!                                     5. Reply (AddSignal only)
//! 6. Await oneshot receiver  <------
//! ```
//!
//! Only `SignalAdded` carries a reply channel: adding a signal to a missing axis is the one
//! failure that is reported back to the remote caller. Every other call is acknowledged as
//! soon as its event is enqueued.

use crate::data::ingest::Batch;
use crate::data::registry::{AxisId, AxisSpec, SignalId, SignalOutcome, SignalSpec};
use crate::error::PlotResult;
use tokio::sync::oneshot;

/// Reply channel for [`PlotEvent::SignalAdded`].
pub type SignalReply = oneshot::Sender<PlotResult<SignalOutcome>>;

/// One registry mutation or sample batch, in the order producers submitted them.
#[derive(Debug)]
pub enum PlotEvent {
    AxisAdded(AxisSpec),
    AxisRemoved {
        axis_id: AxisId,
    },
    SignalAdded {
        spec: SignalSpec,
        /// Receives the registry outcome once the consumer applied the event.
        reply: Option<SignalReply>,
    },
    SignalRemoved {
        signal_id: SignalId,
    },
    AllCleared,
    BatchReceived(Batch),
}

impl PlotEvent {
    /// Creates a `SignalAdded` event together with the receiver for its outcome.
    ///
    /// ```rust
    /// use remote_plot::data::SignalSpec;
    /// use remote_plot::messages::PlotEvent;
    ///
    /// let spec = SignalSpec { axis_id: 1, signal_id: 10, name: "Accel X".into(), color: None };
    /// let (event, rx) = PlotEvent::add_signal(spec);
    /// // publisher.publish(event).await?;
    /// // let outcome = rx.await?;
    /// # drop((event, rx));
    /// ```
    pub fn add_signal(spec: SignalSpec) -> (Self, oneshot::Receiver<PlotResult<SignalOutcome>>) {
        let (tx, rx) = oneshot::channel();
        (
            PlotEvent::SignalAdded {
                spec,
                reply: Some(tx),
            },
            rx,
        )
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PlotEvent::AxisAdded(_) => "axis_added",
            PlotEvent::AxisRemoved { .. } => "axis_removed",
            PlotEvent::SignalAdded { .. } => "signal_added",
            PlotEvent::SignalRemoved { .. } => "signal_removed",
            PlotEvent::AllCleared => "all_cleared",
            PlotEvent::BatchReceived(_) => "batch_received",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Color;

    #[test]
    fn add_signal_helper_wires_reply() {
        let spec = SignalSpec {
            axis_id: 1,
            signal_id: 10,
            name: "S".into(),
            color: None,
        };
        let (event, mut rx) = PlotEvent::add_signal(spec.clone());
        let PlotEvent::SignalAdded { spec: got, reply } = event else {
            panic!("unexpected event");
        };
        assert_eq!(got, spec);

        let outcome = SignalOutcome::Created {
            color: Color::rgb(1, 2, 3),
            color_fallback: false,
        };
        reply.unwrap().send(Ok(outcome.clone())).unwrap();
        assert_eq!(rx.try_recv().unwrap().unwrap(), outcome);
    }

    #[test]
    fn kinds_are_distinct() {
        let kinds = [
            PlotEvent::AxisRemoved { axis_id: 1 }.kind(),
            PlotEvent::SignalRemoved { signal_id: 1 }.kind(),
            PlotEvent::AllCleared.kind(),
            PlotEvent::BatchReceived(Batch::default()).kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
