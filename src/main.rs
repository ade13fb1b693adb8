// src/main.rs
//! Visit Tracker Server Entry Point
//! Loads configuration, binds the visit counter to its data directory and
//! starts the HTTP server.
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use visit_tracker::api::server::VisitServer;
use visit_tracker::core::config::AppConfig;
use visit_tracker::counter::lifecycle::CounterLifecycle;

#[derive(Parser)]
#[command(name = "visit-tracker")]
#[command(about = "Personal blog visit-tracking server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address override
    #[arg(long)]
    host: Option<String>,

    /// Port override
    #[arg(long)]
    port: Option<u16>,

    /// Data directory override (holds the visit count backing file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Reset the persisted visit count to zero before serving
    #[arg(long)]
    reset_visits: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;

    info!("Starting visit-tracker v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.counter.data_dir = data_dir;
    }

    let lifecycle = Arc::new(CounterLifecycle::new(config.counter.clone()));
    let counter = lifecycle.init(config.counter.backing_file());

    if args.reset_visits {
        counter.reset().await?;
        info!("visit count reset at operator request");
    }
    info!("current visit count: {}", counter.current());

    VisitServer::new(config, lifecycle).start().await?;

    info!("shutdown complete");
    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
