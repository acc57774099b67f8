//! `PlotService` implementation.
//!
//! Every call runs on its own tonic task and is admitted through a bounded worker pool
//! (`server.max_workers` permits). A handler never touches plot state: it converts the
//! request into a [`PlotEvent`], publishes it on the dispatch bridge and acknowledges.
//! `AddSignal` is the exception that waits for the consumer's answer, so a missing axis
//! is reported to the caller as `NOT_FOUND`.

use crate::bridge::EventPublisher;
use crate::config::PlotConfig;
use crate::data::ingest::{Batch, SamplePoint};
use crate::data::registry::{AxisSpec, SignalSpec};
use crate::error::{PlotError, PlotResult};
use crate::grpc::error_mapping::PlotResultExt;
use crate::grpc::proto::{
    plot_service_server::{PlotService, PlotServiceServer},
    Ack, AddAxisRequest, AddSignalRequest, ClearAllRequest, RemoveAxisRequest,
    RemoveSignalRequest, StreamBatch,
};
use crate::messages::PlotEvent;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Code, Request, Response, Status, Streaming};
use tracing::{debug, info, instrument, warn};

impl From<AddAxisRequest> for AxisSpec {
    fn from(req: AddAxisRequest) -> Self {
        AxisSpec {
            id: req.axis_id,
            samples: i64::from(req.number_of_samples),
            title: req.plot_title,
            x_label: req.x_axis_title,
            y_label: req.y_axis_title,
        }
    }
}

impl From<AddSignalRequest> for SignalSpec {
    fn from(req: AddSignalRequest) -> Self {
        SignalSpec {
            axis_id: req.axis_id,
            signal_id: req.signal_id,
            name: req.signal_name,
            color: req.signal_color,
        }
    }
}

impl From<StreamBatch> for Batch {
    fn from(batch: StreamBatch) -> Self {
        Batch::new(
            batch
                .points
                .into_iter()
                .map(|p| SamplePoint {
                    signal_id: p.signal_id,
                    value: p.value,
                })
                .collect(),
        )
    }
}

/// gRPC handler: a worker pool in front of an [`EventPublisher`].
#[derive(Debug, Clone)]
pub struct PlotServiceImpl {
    publisher: EventPublisher,
    workers: Arc<Semaphore>,
    max_workers: usize,
    reply_timeout: Duration,
}

impl PlotServiceImpl {
    pub fn new(publisher: EventPublisher, max_workers: usize, reply_timeout: Duration) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            publisher,
            workers: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            reply_timeout,
        }
    }

    pub fn from_config(config: &PlotConfig, publisher: EventPublisher) -> Self {
        Self::new(
            publisher,
            config.server.max_workers,
            config.bridge.reply_timeout(),
        )
    }

    /// Free worker slots right now.
    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Waits for a worker slot, giving up after the reply timeout.
    async fn acquire_worker(&self) -> PlotResult<OwnedSemaphorePermit> {
        match tokio::time::timeout(self.reply_timeout, self.workers.clone().acquire_owned()).await
        {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_closed)) => Err(PlotError::BridgeClosed),
            Err(_elapsed) => {
                warn!(max_workers = self.max_workers, "No free worker slot");
                Err(PlotError::WorkersExhausted {
                    max: self.max_workers,
                })
            }
        }
    }

    /// Admits a unary call, publishes its event and acknowledges.
    async fn enqueue(&self, event: PlotEvent) -> Result<Response<Ack>, Status> {
        let _permit = self.acquire_worker().await.map_plot_err()?;
        self.publisher.publish(event).await.map_plot_err()?;
        Ok(Response::new(Ack::default()))
    }

    pub fn into_service(self) -> PlotServiceServer<Self> {
        PlotServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl PlotService for PlotServiceImpl {
    #[instrument(skip_all, fields(axis_id = request.get_ref().axis_id))]
    async fn add_axis(&self, request: Request<AddAxisRequest>) -> Result<Response<Ack>, Status> {
        debug!("AddAxis");
        self.enqueue(PlotEvent::AxisAdded(request.into_inner().into()))
            .await
    }

    #[instrument(skip_all, fields(axis_id = request.get_ref().axis_id))]
    async fn remove_axis(
        &self,
        request: Request<RemoveAxisRequest>,
    ) -> Result<Response<Ack>, Status> {
        debug!("RemoveAxis");
        self.enqueue(PlotEvent::AxisRemoved {
            axis_id: request.into_inner().axis_id,
        })
        .await
    }

    #[instrument(
        skip_all,
        fields(
            axis_id = request.get_ref().axis_id,
            signal_id = request.get_ref().signal_id
        )
    )]
    async fn add_signal(
        &self,
        request: Request<AddSignalRequest>,
    ) -> Result<Response<Ack>, Status> {
        let _permit = self.acquire_worker().await.map_plot_err()?;
        let (event, reply) = PlotEvent::add_signal(request.into_inner().into());
        self.publisher.publish(event).await.map_plot_err()?;

        let outcome = match tokio::time::timeout(self.reply_timeout, reply).await {
            Ok(Ok(outcome)) => outcome,
            // Consumer dropped the reply without answering: it is shutting down.
            Ok(Err(_)) => Err(PlotError::BridgeClosed),
            Err(_) => Err(PlotError::ConsumerTimeout),
        };
        let outcome = outcome.map_plot_err()?;
        debug!(?outcome, "AddSignal applied");
        Ok(Response::new(Ack::default()))
    }

    #[instrument(skip_all, fields(signal_id = request.get_ref().signal_id))]
    async fn remove_signal(
        &self,
        request: Request<RemoveSignalRequest>,
    ) -> Result<Response<Ack>, Status> {
        debug!("RemoveSignal");
        self.enqueue(PlotEvent::SignalRemoved {
            signal_id: request.into_inner().signal_id,
        })
        .await
    }

    #[instrument(skip_all)]
    async fn clear_all(&self, _request: Request<ClearAllRequest>) -> Result<Response<Ack>, Status> {
        debug!("ClearAll");
        self.enqueue(PlotEvent::AllCleared).await
    }

    #[instrument(skip_all, fields(remote = ?request.remote_addr()))]
    async fn stream_plot(
        &self,
        request: Request<Streaming<StreamBatch>>,
    ) -> Result<Response<Ack>, Status> {
        // The permit is held for the lifetime of the stream.
        let _permit = self.acquire_worker().await.map_plot_err()?;
        let mut stream = request.into_inner();
        let mut batches_received: u64 = 0;
        info!("Stream opened");

        loop {
            match stream.message().await {
                Ok(Some(batch)) => {
                    if let Err(e) = self
                        .publisher
                        .publish(PlotEvent::BatchReceived(batch.into()))
                        .await
                    {
                        warn!(batches_received, error = %e, "Stream aborted, batch not enqueued");
                        return Err(e).map_plot_err();
                    }
                    batches_received += 1;
                }
                Ok(None) => break,
                Err(status) if status.code() == Code::Cancelled => {
                    info!(batches_received, "Stream cancelled by peer");
                    break;
                }
                Err(status) => {
                    warn!(batches_received, %status, "Stream ended with error");
                    break;
                }
            }
        }

        info!(batches_received, "Stream closed");
        Ok(Response::new(Ack { batches_received }))
    }
}

/// Binds `server.host:server.port` and serves until `shutdown` resolves.
pub async fn serve<F>(config: &PlotConfig, publisher: EventPublisher, shutdown: F) -> PlotResult<()>
where
    F: Future<Output = ()> + Send,
{
    let address = config.server.address();
    let listener = TcpListener::bind(&address).await?;
    serve_with_listener(
        listener,
        PlotServiceImpl::from_config(config, publisher),
        shutdown,
    )
    .await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    service: PlotServiceImpl,
    shutdown: F,
) -> PlotResult<()>
where
    F: Future<Output = ()> + Send,
{
    let local = listener.local_addr()?;
    info!(
        address = %local,
        max_workers = service.max_workers,
        "gRPC plot server listening"
    );

    Server::builder()
        .add_service(service.into_service())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("gRPC plot server stopped");
    Ok(())
}
