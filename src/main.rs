use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chef_vibes_api::config::AppConfig;
use chef_vibes_api::database::{DatabaseManager, DocumentStore, MemoryStore};
use chef_vibes_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "chef-vibes-api", version, about = "Chef Vibes recipe API server")]
struct Args {
    /// Listen port; overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Keep all data in process memory instead of connecting to MongoDB
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up ACCESS_TOKEN, DB_USER, etc.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();
    tracing::info!("Starting Chef Vibes API in {:?} mode", config.environment);

    let store: Arc<dyn DocumentStore> = if args.in_memory {
        tracing::warn!("Running with the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to MongoDB")?,
        )
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("The port is running on: {}", config.server.port);

    let state = AppState::new(store, config);
    chef_vibes_api::serve(listener, state, chef_vibes_api::shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
