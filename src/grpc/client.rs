//! Typed client for the plot service.

use crate::data::ingest::Batch;
use crate::data::registry::{AxisSpec, SignalSpec};
use crate::error::PlotResult;
use crate::grpc::proto::{
    plot_service_client::PlotServiceClient, Ack, AddAxisRequest, AddSignalRequest,
    ClearAllRequest, RemoveAxisRequest, RemoveSignalRequest, StreamBatch, StreamPoint,
};
use crate::layout::Layout;
use futures::Stream;
use tonic::transport::Channel;
use tonic::Status;
use tracing::info;

impl From<Batch> for StreamBatch {
    fn from(batch: Batch) -> Self {
        StreamBatch {
            points: batch
                .points
                .into_iter()
                .map(|p| StreamPoint {
                    signal_id: p.signal_id,
                    value: p.value,
                })
                .collect(),
        }
    }
}

/// Adds the `http://` scheme when the address has none (`localhost:50051`).
pub fn endpoint_uri(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

#[derive(Debug, Clone)]
pub struct PlotClient {
    inner: PlotServiceClient<Channel>,
}

impl PlotClient {
    pub async fn connect(address: &str) -> PlotResult<Self> {
        let inner = PlotServiceClient::connect(endpoint_uri(address)).await?;
        Ok(Self { inner })
    }

    pub async fn add_axis(&mut self, spec: &AxisSpec) -> Result<Ack, Status> {
        let samples = i32::try_from(spec.samples).unwrap_or(i32::MAX);
        let ack = self
            .inner
            .add_axis(AddAxisRequest {
                axis_id: spec.id,
                number_of_samples: samples,
                plot_title: spec.title.clone(),
                x_axis_title: spec.x_label.clone(),
                y_axis_title: spec.y_label.clone(),
            })
            .await?;
        Ok(ack.into_inner())
    }

    pub async fn remove_axis(&mut self, axis_id: i32) -> Result<Ack, Status> {
        Ok(self
            .inner
            .remove_axis(RemoveAxisRequest { axis_id })
            .await?
            .into_inner())
    }

    pub async fn add_signal(&mut self, spec: &SignalSpec) -> Result<Ack, Status> {
        let ack = self
            .inner
            .add_signal(AddSignalRequest {
                axis_id: spec.axis_id,
                signal_id: spec.signal_id,
                signal_name: spec.name.clone(),
                signal_color: spec.color.clone(),
            })
            .await?;
        Ok(ack.into_inner())
    }

    pub async fn remove_signal(&mut self, signal_id: i32) -> Result<Ack, Status> {
        Ok(self
            .inner
            .remove_signal(RemoveSignalRequest { signal_id })
            .await?
            .into_inner())
    }

    pub async fn clear_all(&mut self) -> Result<Ack, Status> {
        Ok(self.inner.clear_all(ClearAllRequest {}).await?.into_inner())
    }

    /// Opens one `StreamPlot` call and sends every batch the stream yields.
    /// Resolves once the stream ends and the server acknowledged.
    pub async fn stream<S>(&mut self, batches: S) -> Result<Ack, Status>
    where
        S: Stream<Item = StreamBatch> + Send + 'static,
    {
        Ok(self.inner.stream_plot(batches).await?.into_inner())
    }

    /// Sends a fixed sequence of batches over one `StreamPlot` call.
    pub async fn stream_batches<I>(&mut self, batches: I) -> Result<Ack, Status>
    where
        I: IntoIterator<Item = Batch>,
    {
        let batches: Vec<StreamBatch> = batches.into_iter().map(StreamBatch::from).collect();
        self.stream(tokio_stream::iter(batches)).await
    }

    /// Registers every axis of the layout, then its signals, in declaration order.
    pub async fn apply_layout(&mut self, layout: &Layout) -> Result<(), Status> {
        for axis in &layout.axes {
            self.add_axis(&axis.axis_spec()).await?;
            info!(axis_id = axis.id, title = %axis.title, "Added axis");
            for signal in axis.signal_specs() {
                self.add_signal(&signal).await?;
                info!(
                    axis_id = axis.id,
                    signal_id = signal.signal_id,
                    name = %signal.name,
                    "Added signal"
                );
            }
        }
        Ok(())
    }
}
