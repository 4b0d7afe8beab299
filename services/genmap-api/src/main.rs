//! Genmap API Server
//!
//! Renders typhoon position maps and publishes them to an R2 bucket.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use genmap_api::build_router;
use genmap_api::config::GenMapConfig;
use genmap_api::state::AppState;

/// Genmap API Server
#[derive(Parser, Debug)]
#[command(name = "genmap-api")]
#[command(about = "Typhoon position map renderer")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "GENMAP_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "GENMAP_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Build runtime with configured threads
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting genmap API server");

    let config = GenMapConfig::from_env().context("Invalid configuration")?;
    info!(
        endpoint = %config.storage.endpoint,
        bucket = %config.storage.bucket,
        public_base_url = %config.public_base_url,
        tiles = %config.tiles.url_template,
        zoom = config.map.zoom,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);

    let app = build_router(state, Some(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", args.listen))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, "Listening");

    axum::serve(listener, app).await?;

    Ok(())
}
