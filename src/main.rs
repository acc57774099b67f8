//! CLI Entry Point for remote-plot
//!
//! Provides command-line interface for:
//! - Running the plot server (native window, or headless)
//! - Uploading a plot layout to a running server
//! - Streaming synthetic samples for a layout
//!
//! # Usage
//!
//! Start the server with a window:
//! ```bash
//! remote-plot serve --config config/plot.toml
//! ```
//!
//! Register the IMU plots and feed them:
//! ```bash
//! remote-plot configure --address localhost:50051 --layout config/imu.toml
//! remote-plot simulate --address localhost:50051 --layout config/imu.toml --rate 100
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use remote_plot::bridge;
use remote_plot::config::PlotConfig;
use remote_plot::consumer::{LogSink, PlotConsumer};
use remote_plot::data::{Batch, SignalId};
use remote_plot::grpc::{self, proto::StreamBatch, PlotClient};
use remote_plot::layout::Layout;
use remote_plot::tracing_setup::{self, TracingConfig};
use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_stream::wrappers::IntervalStream;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "remote-plot")]
#[command(about = "Live plots fed by remote producers over gRPC", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the plot server
    Serve {
        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// gRPC port, overrides the configuration
        #[arg(long)]
        port: Option<u16>,

        /// Run without a window; updates are logged
        #[arg(long)]
        headless: bool,
    },

    /// Upload a plot layout to a running server
    Configure {
        /// Server address
        #[arg(short, long, default_value = "localhost:50051")]
        address: String,

        /// Layout TOML file
        #[arg(short, long)]
        layout: PathBuf,
    },

    /// Stream synthetic sine waves for every signal of a layout
    Simulate {
        /// Server address
        #[arg(short, long, default_value = "localhost:50051")]
        address: String,

        /// Layout TOML file
        #[arg(short, long)]
        layout: PathBuf,

        /// Batches per second
        #[arg(long, default_value = "50")]
        rate: f64,

        /// Stop after this many batches (default: until Ctrl+C)
        #[arg(long)]
        count: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            headless,
        } => serve(config, port, headless),
        Commands::Configure { address, layout } => {
            init_cli_tracing()?;
            runtime()?.block_on(configure(&address, &layout))
        }
        Commands::Simulate {
            address,
            layout,
            rate,
            count,
        } => {
            init_cli_tracing()?;
            runtime()?.block_on(simulate(&address, &layout, rate, count))
        }
    }
}

fn init_cli_tracing() -> Result<()> {
    tracing_setup::init(TracingConfig::default()).map_err(anyhow::Error::msg)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("plot-worker")
        .build()
        .context("Failed to start the async runtime")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

fn serve(config_path: Option<PathBuf>, port: Option<u16>, headless: bool) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => PlotConfig::load_from(path)?,
        None => PlotConfig::load()?,
    };
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;
    tracing_setup::init_from_config(&config).map_err(anyhow::Error::msg)?;

    info!(
        name = %config.application.name,
        address = %config.server.address(),
        queue = config.bridge.capacity,
        "Starting plot server"
    );

    let runtime = runtime()?;
    let (publisher, events) = bridge::channel(&config.bridge);

    #[cfg(feature = "gui")]
    if !headless {
        return serve_with_window(runtime, config, publisher, events);
    }
    #[cfg(not(feature = "gui"))]
    if !headless {
        info!("Built without the gui feature, running headless");
    }

    runtime.block_on(async {
        let consumer = PlotConsumer::from_settings(&config.plot, LogSink::default())?;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = grpc::serve(&config, publisher, async move {
            shutdown_signal().await;
            info!("Shutdown requested");
            let _ = stop_tx.send(());
        });
        let consumer = consumer.run(events, async move {
            let _ = stop_rx.await;
        });

        let (served, consumer) = tokio::join!(server, consumer);
        let stats = consumer.ingest_stats();
        info!(
            events = consumer.events_applied(),
            batches = stats.batches,
            dropped_points = stats.dropped_points,
            "Plot consumer stopped"
        );
        served?;
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(feature = "gui")]
fn serve_with_window(
    runtime: tokio::runtime::Runtime,
    config: PlotConfig,
    publisher: bridge::EventPublisher,
    events: bridge::EventReceiver,
) -> Result<()> {
    use remote_plot::gui::{self, FrameSink, PlotterApp};

    let consumer = PlotConsumer::from_settings(&config.plot, FrameSink::default())?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_config = config.clone();
    let server = runtime.spawn(async move {
        grpc::serve(&server_config, publisher, async move {
            let _ = stop_rx.await;
        })
        .await
    });

    // The window owns the main thread until it is closed.
    let shown = gui::run(&config.plot.window_title, PlotterApp::new(consumer, events));

    let _ = stop_tx.send(());
    runtime
        .block_on(server)
        .context("gRPC server task failed")??;
    shown.map_err(|e| anyhow::anyhow!("Plot window failed: {e}"))
}

async fn configure(address: &str, layout_path: &Path) -> Result<()> {
    let layout = Layout::load(layout_path)
        .with_context(|| format!("Failed to load layout {}", layout_path.display()))?;
    info!(address, axes = layout.axes.len(), "Configuring plots");

    let mut client = PlotClient::connect(address)
        .await
        .with_context(|| format!("Plot server unavailable at {address}. Is it running?"))?;
    client.apply_layout(&layout).await?;

    info!("Configuration complete, plots are ready");
    Ok(())
}

/// One batch of phase-shifted sine samples, one point per signal.
fn synthetic_batch(signal_ids: &[SignalId], step: usize, rate: f64) -> Batch {
    let t = step as f64 / rate;
    signal_ids
        .iter()
        .enumerate()
        .map(|(k, &id)| {
            let phase = k as f64 * TAU / signal_ids.len().max(1) as f64;
            (id, (TAU * 0.5 * t + phase).sin() * (1.0 + k as f64 * 0.25))
        })
        .collect()
}

async fn simulate(
    address: &str,
    layout_path: &Path,
    rate: f64,
    count: Option<usize>,
) -> Result<()> {
    if !(rate.is_finite() && rate > 0.0) {
        bail!("--rate must be a positive number, got {rate}");
    }
    let layout = Layout::load(layout_path)
        .with_context(|| format!("Failed to load layout {}", layout_path.display()))?;
    let signal_ids = layout.signal_ids();
    if signal_ids.is_empty() {
        bail!("Layout {} declares no signals", layout_path.display());
    }

    let mut client = PlotClient::connect(address)
        .await
        .with_context(|| format!("Plot server unavailable at {address}. Is it running?"))?;
    info!(address, signals = signal_ids.len(), rate, "Streaming synthetic samples");

    let interval = tokio::time::interval(Duration::from_secs_f64(1.0 / rate));
    let batches = IntervalStream::new(interval)
        .enumerate()
        .map(move |(step, _)| StreamBatch::from(synthetic_batch(&signal_ids, step, rate)))
        .take(count.unwrap_or(usize::MAX))
        .take_until(shutdown_signal());

    let ack = client.stream(batches).await?;
    info!(batches = ack.batches_received, "Stream acknowledged");
    Ok(())
}
