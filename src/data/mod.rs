//! Plot state owned by the consumer: registry, ring buffers, palette and ingestion.
pub mod ingest;
pub mod palette;
pub mod registry;
pub mod ring_buffer;

pub use ingest::{Batch, IngestReport, Ingestor, SamplePoint};
pub use palette::{Color, Palette};
pub use registry::{AxisId, AxisSpec, Registry, SignalId, SignalSpec};
pub use ring_buffer::RingBuffer;
