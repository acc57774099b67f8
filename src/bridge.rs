//! Dispatch bridge: bounded, ordered handoff from producers to the plot consumer.
//!
//! Any number of [`EventPublisher`] clones (one per gRPC worker) feed a single
//! [`EventReceiver`]. The bridge is a `tokio::sync::mpsc` channel and performs no business
//! logic: events are delivered whole, in the order they were enqueued.
//!
//! # Backpressure
//!
//! The queue is bounded by `bridge.capacity`. When it is full, a publisher waits at most
//! `bridge.send_timeout_ms` for space and then gives up with [`PlotError::QueueFull`], which
//! the gRPC layer reports as `RESOURCE_EXHAUSTED`. Nothing is dropped silently and memory
//! stays bounded under a slow consumer.
//!
//! The receiver side offers both a non-blocking [`EventReceiver::try_recv`] (for the GUI,
//! which drains once per frame) and an async [`EventReceiver::recv`] (headless mode).

use crate::config::BridgeConfig;
use crate::error::{PlotError, PlotResult};
use crate::messages::PlotEvent;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError, error::TryRecvError, error::TrySendError};
use tracing::warn;

/// Creates a connected publisher/receiver pair sized from configuration.
pub fn channel(config: &BridgeConfig) -> (EventPublisher, EventReceiver) {
    with_capacity(config.capacity, config.send_timeout())
}

/// Creates a connected publisher/receiver pair with explicit limits.
pub fn with_capacity(capacity: usize, send_timeout: Duration) -> (EventPublisher, EventReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (
        EventPublisher {
            tx,
            capacity,
            send_timeout,
        },
        EventReceiver {
            rx,
            disconnected: false,
        },
    )
}

/// Producer handle. Cheap to clone; one per worker.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<PlotEvent>,
    capacity: usize,
    send_timeout: Duration,
}

impl EventPublisher {
    /// Enqueues an event, waiting up to the configured timeout for queue space.
    pub async fn publish(&self, event: PlotEvent) -> PlotResult<()> {
        match self.tx.send_timeout(event, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(event)) => {
                warn!(
                    kind = event.kind(),
                    capacity = self.capacity,
                    "Event queue full, rejecting"
                );
                Err(PlotError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(SendTimeoutError::Closed(_)) => Err(PlotError::BridgeClosed),
        }
    }

    /// Enqueues an event only if there is space right now.
    pub fn try_publish(&self, event: PlotEvent) -> PlotResult<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PlotError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Closed(_)) => Err(PlotError::BridgeClosed),
        }
    }

    /// Queue bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events currently waiting for the consumer.
    pub fn queued(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// True once the receiver was dropped or closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle. Exactly one exists per bridge.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<PlotEvent>,
    disconnected: bool,
}

impl EventReceiver {
    /// Waits for the next event. `None` once every publisher is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<PlotEvent> {
        let event = self.rx.recv().await;
        if event.is_none() {
            self.disconnected = true;
        }
        event
    }

    /// Takes the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<PlotEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Stops accepting new events. Events already queued can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// True once a receive observed that no publisher is left and the queue is drained.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}
