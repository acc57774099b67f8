//! Semantic mapping from `PlotError` to gRPC `Status` codes.
//!
//! # Mapping Philosophy
//!
//! - **NotFound**: the call referenced an axis that does not exist
//! - **InvalidArgument**: the client sent input that cannot be accepted
//! - **ResourceExhausted**: backpressure; the queue or the worker pool stayed full, retry later
//! - **DeadlineExceeded**: the consumer did not answer in time
//! - **Unavailable**: the consumer is shutting down
//! - **Internal**: server-side plumbing failures

use crate::error::PlotError;
use tonic::{Code, Status};

/// Map a PlotError to an appropriate gRPC Status.
///
/// # Examples
///
/// ```
/// use remote_plot::error::PlotError;
/// use remote_plot::grpc::map_plot_error_to_status;
/// use tonic::Code;
///
/// let status = map_plot_error_to_status(PlotError::QueueFull { capacity: 1024 });
/// assert_eq!(status.code(), Code::ResourceExhausted);
/// ```
pub fn map_plot_error_to_status(err: PlotError) -> Status {
    match err {
        PlotError::AxisNotFound(axis_id) => {
            Status::new(Code::NotFound, format!("Axis {} does not exist", axis_id))
        }
        PlotError::InvalidColor(token) => {
            Status::new(Code::InvalidArgument, format!("Invalid color '{}'", token))
        }

        // Backpressure → ResourceExhausted, client may retry
        err @ (PlotError::QueueFull { .. } | PlotError::WorkersExhausted { .. }) => {
            Status::new(Code::ResourceExhausted, err.to_string())
        }
        // The event stays queued, so the request may still take effect.
        PlotError::ConsumerTimeout => Status::new(
            Code::DeadlineExceeded,
            "Plot consumer did not respond in time; the request is queued and may still be applied",
        ),
        PlotError::BridgeClosed => {
            Status::new(Code::Unavailable, "Plot consumer is shutting down")
        }

        PlotError::Config(e) => Status::new(Code::InvalidArgument, format!("Config error: {}", e)),
        PlotError::Configuration(msg) => Status::new(
            Code::InvalidArgument,
            format!("Configuration error: {}", msg),
        ),
        PlotError::Layout(e) => {
            Status::new(Code::InvalidArgument, format!("Layout error: {}", e))
        }

        PlotError::Io(e) => Status::new(Code::Internal, format!("I/O error: {}", e)),
        PlotError::Transport(e) => {
            Status::new(Code::Internal, format!("Transport error: {}", e))
        }
    }
}

/// Extension trait for converting `PlotResult<T>` to `Result<T, Status>`
pub trait PlotResultExt<T> {
    /// Convert a PlotError result to a tonic Status result
    fn map_plot_err(self) -> Result<T, Status>;
}

impl<T> PlotResultExt<T> for Result<T, PlotError> {
    fn map_plot_err(self) -> Result<T, Status> {
        self.map_err(map_plot_error_to_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors() {
        assert_eq!(
            map_plot_error_to_status(PlotError::AxisNotFound(4)).code(),
            Code::NotFound
        );
        assert_eq!(
            map_plot_error_to_status(PlotError::InvalidColor("zz".into())).code(),
            Code::InvalidArgument
        );
    }

    #[test]
    fn backpressure_is_resource_exhausted() {
        let status = map_plot_error_to_status(PlotError::QueueFull { capacity: 2 });
        assert_eq!(status.code(), Code::ResourceExhausted);
        assert!(status.message().contains("capacity 2"));
        assert_eq!(
            map_plot_error_to_status(PlotError::WorkersExhausted { max: 10 }).code(),
            Code::ResourceExhausted
        );
    }

    #[test]
    fn consumer_failures() {
        let status = map_plot_error_to_status(PlotError::ConsumerTimeout);
        assert_eq!(status.code(), Code::DeadlineExceeded);
        assert!(status.message().contains("may still be applied"));
        assert_eq!(
            map_plot_error_to_status(PlotError::BridgeClosed).code(),
            Code::Unavailable
        );
    }

    #[test]
    fn io_is_internal() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        assert_eq!(map_plot_error_to_status(err.into()).code(), Code::Internal);
    }

    #[test]
    fn result_ext() {
        let ok: Result<u8, PlotError> = Ok(1);
        assert_eq!(ok.map_plot_err().unwrap(), 1);
        let err: Result<u8, PlotError> = Err(PlotError::Configuration("bad".into()));
        assert_eq!(err.map_plot_err().unwrap_err().code(), Code::InvalidArgument);
    }
}
