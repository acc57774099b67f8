//! gRPC surface of the plotter.
//!
//! Remote producers use the `PlotService` defined in `proto/plot.proto` to register axes
//! and signals and to stream sample batches. The server side ([`server`]) only translates
//! requests into [`crate::messages::PlotEvent`]s and publishes them on the dispatch bridge;
//! the plot consumer applies them. [`client`] is a thin typed wrapper used by the
//! `configure` and `simulate` subcommands and by the integration tests.
//!
//! # Example
//! ```no_run
//! use remote_plot::{bridge, config::PlotConfig, grpc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlotConfig::load()?;
//!     let (publisher, _events) = bridge::channel(&config.bridge);
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     grpc::serve(&config, publisher, shutdown).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error_mapping;
pub mod server;

/// Protocol Buffer definitions for the plot service
pub mod proto {
    //! Generated from `proto/plot.proto`: the `PlotService` trait, its server and client,
    //! and the request/acknowledgment messages.
    tonic::include_proto!("plot");
}

pub use client::PlotClient;
pub use error_mapping::{map_plot_error_to_status, PlotResultExt};
pub use server::{serve, serve_with_listener, PlotServiceImpl};
