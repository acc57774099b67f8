//! End-to-end tests: a real `PlotService` on a loopback port, a headless consumer task,
//! and `PlotClient` as the producer.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use remote_plot::bridge::{self, EventReceiver};
use remote_plot::consumer::{PlotConsumer, RecordingSink, RenderUpdate};
use remote_plot::data::registry::DEFAULT_MAX_CAPACITY;
use remote_plot::data::{AxisSpec, Batch, Registry, SignalSpec};
use remote_plot::error::PlotResult;
use remote_plot::grpc::{proto::StreamBatch, serve_with_listener, PlotClient, PlotServiceImpl};
use remote_plot::layout::Layout;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Code;

struct Harness {
    addr: SocketAddr,
    stop_server: oneshot::Sender<()>,
    server: JoinHandle<PlotResult<()>>,
    stop_consumer: oneshot::Sender<()>,
    consumer: JoinHandle<PlotConsumer<RecordingSink>>,
}

async fn start_server(
    max_workers: usize,
    events: (bridge::EventPublisher, EventReceiver),
) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<PlotResult<()>>, EventReceiver) {
    let (publisher, receiver) = events;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = PlotServiceImpl::new(publisher, max_workers, Duration::from_secs(2));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_listener(listener, service, async move {
        let _ = stop_rx.await;
    }));
    (addr, stop_tx, server, receiver)
}

impl Harness {
    async fn start() -> Self {
        Self::start_with(10).await
    }

    async fn start_with(max_workers: usize) -> Self {
        let (addr, stop_server, server, receiver) = start_server(
            max_workers,
            bridge::with_capacity(1024, Duration::from_millis(200)),
        )
        .await;
        let (stop_consumer, stop_rx) = oneshot::channel::<()>();
        let consumer = tokio::spawn(
            PlotConsumer::new(Registry::default(), RecordingSink::default()).run(
                receiver,
                async move {
                    let _ = stop_rx.await;
                },
            ),
        );
        Self {
            addr,
            stop_server,
            server,
            stop_consumer,
            consumer,
        }
    }

    async fn client(&self) -> PlotClient {
        PlotClient::connect(&self.addr.to_string()).await.unwrap()
    }

    /// Stops the consumer (draining everything acknowledged so far), then the server.
    async fn finish(self) -> PlotConsumer<RecordingSink> {
        self.stop_consumer.send(()).unwrap();
        let consumer = self.consumer.await.unwrap();
        let _ = self.stop_server.send(());
        self.server.await.unwrap().unwrap();
        consumer
    }
}

fn axis(id: i32, samples: i64) -> AxisSpec {
    AxisSpec {
        id,
        samples,
        title: "T".into(),
        x_label: "x".into(),
        y_label: "y".into(),
    }
}

fn signal(axis_id: i32, signal_id: i32) -> SignalSpec {
    SignalSpec {
        axis_id,
        signal_id,
        name: "S".into(),
        color: None,
    }
}

fn batches(points: &[&[(i32, f64)]]) -> Vec<Batch> {
    points
        .iter()
        .map(|b| b.iter().copied().collect())
        .collect()
}

#[tokio::test]
async fn window_holds_last_samples_in_order() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.add_axis(&axis(1, 3)).await.unwrap();
    client.add_signal(&signal(1, 10)).await.unwrap();
    let ack = client
        .stream_batches(batches(&[
            &[(10, 1.0)],
            &[(10, 2.0)],
            &[(10, 3.0)],
            &[(10, 4.0)],
        ]))
        .await
        .unwrap();
    assert_eq!(ack.batches_received, 4);

    let consumer = harness.finish().await;
    assert_eq!(
        consumer.registry().snapshot(10).unwrap(),
        vec![2.0, 3.0, 4.0]
    );
}

#[tokio::test]
async fn absent_signal_flat_lines() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.add_axis(&axis(1, 3)).await.unwrap();
    client.add_signal(&signal(1, 10)).await.unwrap();
    client.add_signal(&signal(1, 11)).await.unwrap();
    client
        .stream_batches(batches(&[&[(10, 5.0)]]))
        .await
        .unwrap();

    let consumer = harness.finish().await;
    let registry = consumer.registry();
    assert_eq!(registry.signal(10).unwrap().buffer().tail(), 5.0);
    assert_eq!(registry.signal(11).unwrap().buffer().tail(), 0.0);
    assert_eq!(
        consumer.sink().updates.last(),
        Some(&RenderUpdate::Tails(vec![(10, 5.0), (11, 0.0)]))
    );
}

#[tokio::test]
async fn add_signal_to_missing_axis_is_not_found() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let status = client.add_signal(&signal(9, 90)).await.unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    let consumer = harness.finish().await;
    assert!(consumer.registry().is_empty());
}

#[tokio::test]
async fn duplicates_and_unknown_removals_are_acknowledged() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.add_axis(&axis(1, 3)).await.unwrap();
    client.add_axis(&axis(1, 50)).await.unwrap();
    client.add_signal(&signal(1, 10)).await.unwrap();
    client.add_signal(&signal(1, 10)).await.unwrap();
    client.remove_axis(42).await.unwrap();
    client.remove_signal(42).await.unwrap();

    let consumer = harness.finish().await;
    assert_eq!(consumer.registry().axis_count(), 1);
    assert_eq!(consumer.registry().axis(1).unwrap().capacity.get(), 3);
    assert_eq!(consumer.registry().signal_count(), 1);
}

#[tokio::test]
async fn oversized_window_is_clamped() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.add_axis(&axis(1, i64::from(i32::MAX))).await.unwrap();
    client.add_signal(&signal(1, 10)).await.unwrap();
    client
        .stream_batches(batches(&[&[(10, 7.0)]]))
        .await
        .unwrap();

    let consumer = harness.finish().await;
    let registry = consumer.registry();
    assert_eq!(registry.axis(1).unwrap().capacity, DEFAULT_MAX_CAPACITY);
    let buffer = registry.signal(10).unwrap().buffer();
    assert_eq!(buffer.capacity(), DEFAULT_MAX_CAPACITY.get());
    assert_eq!(buffer.tail(), 7.0);
}

#[tokio::test]
async fn remove_axis_cascades_and_later_batches_ignore_it() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    client.add_axis(&axis(1, 3)).await.unwrap();
    client.add_axis(&axis(2, 3)).await.unwrap();
    client.add_signal(&signal(1, 10)).await.unwrap();
    client.add_signal(&signal(2, 20)).await.unwrap();
    client.remove_axis(1).await.unwrap();
    client
        .stream_batches(batches(&[&[(10, 1.0), (20, 2.0)]]))
        .await
        .unwrap();

    let consumer = harness.finish().await;
    let registry = consumer.registry();
    assert!(registry.signal(10).is_none());
    assert_eq!(registry.snapshot(20).unwrap(), vec![0.0, 0.0, 2.0]);
    assert_eq!(consumer.ingest_stats().dropped_points, 1);
}

#[tokio::test]
async fn clear_all_empties_registry() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let layout = Layout::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/imu.toml")).unwrap();
    client.apply_layout(&layout).await.unwrap();
    client.clear_all().await.unwrap();

    let consumer = harness.finish().await;
    assert_eq!(consumer.registry().axis_count(), 0);
    assert_eq!(consumer.registry().signal_count(), 0);
    assert_eq!(consumer.sink().updates.last(), Some(&RenderUpdate::AllCleared));
}

#[tokio::test]
async fn imu_layout_registers_colored_signals() {
    let harness = Harness::start().await;
    let mut client = harness.client().await;

    let layout = Layout::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/imu.toml")).unwrap();
    client.apply_layout(&layout).await.unwrap();

    let consumer = harness.finish().await;
    let registry = consumer.registry();
    assert_eq!(registry.axis_count(), 2);
    assert_eq!(registry.signal_count(), 6);
    assert_eq!(registry.axis(1).unwrap().capacity.get(), 300);
    assert_eq!(registry.signal(10).unwrap().name, "Accel X");
    assert_eq!(registry.signal(10).unwrap().color.to_string(), "#ff0000");
    assert_eq!(registry.signal(21).unwrap().color.to_string(), "#ff00ff");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_streams_keep_per_stream_order() {
    let harness = Harness::start().await;
    let mut setup = harness.client().await;
    setup.add_axis(&axis(1, 200)).await.unwrap();
    setup.add_signal(&signal(1, 10)).await.unwrap();
    setup.add_signal(&signal(1, 20)).await.unwrap();

    let mut producers = Vec::new();
    for id in [10, 20] {
        let mut client = harness.client().await;
        producers.push(tokio::spawn(async move {
            let own: Vec<Batch> = (1..=50)
                .map(|i| [(id, f64::from(i))].into_iter().collect())
                .collect();
            client.stream_batches(own).await.unwrap()
        }));
    }
    for producer in producers {
        assert_eq!(producer.await.unwrap().batches_received, 50);
    }

    let consumer = harness.finish().await;
    assert_eq!(consumer.ingest_stats().batches, 100);
    for id in [10, 20] {
        // Zeros come from the other stream's batches; own samples stay in send order.
        let own: Vec<f64> = consumer
            .registry()
            .snapshot(id)
            .unwrap()
            .into_iter()
            .filter(|v| *v != 0.0)
            .collect();
        assert_eq!(own, (1..=50).map(f64::from).collect::<Vec<_>>());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_stream_releases_worker_and_keeps_enqueued_batches() {
    let harness = Harness::start_with(1).await;
    let mut setup = harness.client().await;
    setup.add_axis(&axis(1, 5)).await.unwrap();
    setup.add_signal(&signal(1, 10)).await.unwrap();

    let (tx, rx) = mpsc::channel::<StreamBatch>(8);
    let mut streamer = harness.client().await;
    let stream = tokio::spawn(async move { streamer.stream(ReceiverStream::new(rx)).await });
    for v in [1.0, 2.0] {
        tx.send(StreamBatch::from([(10, v)].into_iter().collect::<Batch>()))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Drop the in-flight call without closing the stream.
    stream.abort();
    let _ = stream.await;
    drop(tx);

    // The single worker slot must be free again.
    setup.add_axis(&axis(2, 5)).await.unwrap();

    let consumer = harness.finish().await;
    assert_eq!(consumer.ingest_stats().batches, 2);
    assert_eq!(
        consumer.registry().snapshot(10).unwrap(),
        vec![0.0, 0.0, 0.0, 1.0, 2.0]
    );
    assert_eq!(consumer.registry().axis_count(), 2);
}

#[tokio::test]
async fn full_queue_fails_calls_with_resource_exhausted() {
    // No consumer: the single queue slot never drains.
    let (addr, stop_server, server, _receiver) = start_server(
        4,
        bridge::with_capacity(1, Duration::from_millis(20)),
    )
    .await;
    let mut client = PlotClient::connect(&addr.to_string()).await.unwrap();

    client.add_axis(&axis(1, 3)).await.unwrap();
    let status = client.add_axis(&axis(2, 3)).await.unwrap_err();
    assert_eq!(status.code(), Code::ResourceExhausted);

    let status = client
        .stream_batches(batches(&[&[(10, 1.0)], &[(10, 2.0)]]))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::ResourceExhausted);

    stop_server.send(()).unwrap();
    server.await.unwrap().unwrap();
}
