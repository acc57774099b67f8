//! # Remote Plot Core Library
//!
//! Remote producers (a sensor process, a test rig, a simulation) register named plot axes
//! and signals over gRPC, then stream batches of samples that scroll through fixed-size
//! windows in a live plot. The library holds everything except the binary's CLI, so the
//! integration tests and other frontends can drive the same pipeline.
//!
//! ## Data Flow
//!
//! ```text
//! gRPC worker tasks --PlotEvent--> bridge (bounded mpsc) --> PlotConsumer --> RenderSink
//!   (grpc::server)                   (bridge)                 (consumer)      (gui / log)
//! ```
//!
//! Only the consumer mutates the [`data::Registry`]; producers hand it immutable events.
//!
//! ## Crate Structure
//!
//! - **`bridge`**: Bounded, ordered handoff from many producers to the single consumer,
//!   with blocking-with-timeout backpressure.
//! - **`config`**: Layered Figment configuration (defaults, `config/plot.toml`,
//!   `REMOTE_PLOT_*` environment variables).
//! - **`consumer`**: Applies events to the registry and emits render updates.
//! - **`data`**: Ring buffers, color palette, the axis/signal registry and the
//!   synchronized-scroll ingestor.
//! - **`error`**: The `PlotError` enum shared by every layer.
//! - **`grpc`**: `PlotService` server, client wrapper and error-to-status mapping.
//! - **`gui`**: Native plot window (`gui` feature).
//! - **`layout`**: TOML plot layouts uploaded by the `configure` subcommand.
//! - **`messages`**: Events carried by the bridge.
//! - **`tracing_setup`**: Subscriber initialization.

pub mod bridge;
pub mod config;
pub mod consumer;
pub mod data;
pub mod error;
pub mod grpc;
pub mod layout;
pub mod messages;
pub mod tracing_setup;

#[cfg(feature = "gui")]
pub mod gui;
