//! Geo-NAP daemon
//!
//! Serves the planning API over a provider cache loaded at startup.

use anyhow::Context;
use clap::Parser;
use geonap_api::{cors_layer, create_router};
use geonap_core::{EngineConfig, LoggingConfig};
use geonap_scheduler::Planner;
use geonap_store::{JsonFileSource, ProviderStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// geonapd - network-aware GPU placement and training cost service
#[derive(Parser, Debug)]
#[command(name = "geonapd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind the API server
    #[arg(long)]
    address: Option<String>,

    /// Port for the REST API server
    #[arg(long)]
    port: Option<u16>,

    /// Provider cache file (JSON)
    #[arg(long)]
    providers: Option<PathBuf>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(parse_level(&config.level))
        .with_target(false);

    if config.format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
    .context("Failed to set tracing subscriber")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(address) = args.address {
        config.api.rest_address = address;
    }
    if let Some(port) = args.port {
        config.api.rest_port = port;
    }
    if let Some(providers) = args.providers {
        config.cache.providers_path = providers;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging)?;

    info!("Starting geonapd v{}", env!("CARGO_PKG_VERSION"));

    let source = Arc::new(JsonFileSource::new(&config.cache.providers_path));
    let store = Arc::new(ProviderStore::new(source, config.catalog.clone()));

    // The API still starts without a catalog; plans return 503 until a reload succeeds
    if let Err(e) = store.reload().await {
        warn!(
            path = %config.cache.providers_path.display(),
            error = %e,
            "Provider cache not loaded"
        );
    }

    let planner = Planner::new(&config);
    let mut router = create_router(planner, store);
    if config.api.cors_enabled {
        router = router.layer(cors_layer(&config.api));
    }

    let addr: SocketAddr = format!("{}:{}", config.api.rest_address, config.api.rest_port)
        .parse()
        .context("Invalid listen address")?;

    info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}
