//! Streamgate Gateway
//!
//! HTTP surface for the Streamgate response delivery layer: an SSE chat
//! completions endpoint and a realtime websocket endpoint, both driven
//! through the delivery channels in `streamgate-delivery`.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

mod config;
mod realtime;
mod routes;
mod source;

use config::GatewayConfig;
use routes::AppState;

#[derive(Parser, Debug)]
#[command(name = "streamgate-gateway")]
#[command(about = "Streamgate streaming response gateway", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Model name reported in response chunks
    #[arg(short, long)]
    pub model: Option<String>,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    pub listen: String,

    /// Listen port
    #[arg(short = 'P', long, default_value = "8080")]
    pub port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting Streamgate Gateway");

    // Load configuration
    let config = GatewayConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Model: {}", config.model);

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    let state = AppState {
        config: Arc::new(config),
        metrics_handle,
    };

    // Build and run the server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Gateway listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("streamgate=debug,axum=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamgate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "streamgate_requests_total",
        "Total number of completion requests processed"
    );
    metrics::describe_counter!(
        "streamgate_events_sent_total",
        "Total number of delta events delivered over SSE"
    );
    metrics::describe_counter!(
        "streamgate_realtime_events_total",
        "Total number of events received on realtime sessions"
    );
    metrics::describe_counter!(
        "streamgate_frames_total",
        "Total number of SSE frames written, by kind"
    );
    metrics::describe_histogram!(
        "streamgate_stream_duration_ms",
        metrics::Unit::Milliseconds,
        "End-to-end duration of a streamed completion"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
