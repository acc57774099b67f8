//! Custom error types for the plotter.
//!
//! This module defines the primary error type, `PlotError`. Using the `thiserror` crate,
//! it provides a centralized way to describe everything that can fail between a remote
//! producer and the plot consumer.
//!
//! ## Error Hierarchy
//!
//! - **`AxisNotFound`**: A signal was added to an axis that does not exist. This is the only
//!   registry failure that is reported back to the caller; duplicate ids and removals of
//!   unknown ids are outcomes, not errors (see [`crate::data::registry`]).
//! - **`InvalidColor`**: A color token could not be parsed. The registry recovers from this by
//!   assigning a palette color, so it only surfaces when a configured palette is invalid.
//! - **`QueueFull`** / **`WorkersExhausted`**: Backpressure. The dispatch bridge or the worker
//!   pool stayed saturated for longer than the configured timeout. Callers may retry.
//! - **`ConsumerTimeout`** / **`BridgeClosed`**: The consumer did not answer in time, or it is
//!   gone altogether (shutdown).
//! - **`Config`**, **`Configuration`**, **`Layout`**: Loading or validating configuration and
//!   plot layouts.
//! - **`Io`**, **`Transport`**: Socket and server plumbing.

use crate::data::registry::AxisId;
use thiserror::Error;

/// Convenience alias for results using the plotter error type.
pub type PlotResult<T> = std::result::Result<T, PlotError>;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Axis {0} does not exist")]
    AxisNotFound(AxisId),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Event queue full (capacity {capacity}), try again later")]
    QueueFull { capacity: usize },

    #[error("All {max} workers are busy, try again later")]
    WorkersExhausted { max: usize },

    #[error("Plot consumer did not respond in time; the request may still be applied")]
    ConsumerTimeout,

    #[error("Plot consumer is no longer running")]
    BridgeClosed,

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Layout parse error: {0}")]
    Layout(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

impl From<figment::Error> for PlotError {
    fn from(err: figment::Error) -> Self {
        PlotError::Config(Box::new(err))
    }
}

impl PlotError {
    /// Whether the caller can reasonably retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlotError::QueueFull { .. } | PlotError::WorkersExhausted { .. } | PlotError::ConsumerTimeout
        )
    }
}
