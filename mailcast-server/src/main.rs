//! mailcast server
//!
//! Receives SES email events from an SNS webhook and streams them to
//! per-campaign WebSocket subscribers.

mod api;
mod config;
mod server;
mod session;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use mailcast_core::broadcast::ChannelRegistry;
use mailcast_core::events::status_update_channel;
use mailcast_core::framework::DatabaseProcessor;
use mailcast_core::processors::StatusWriter;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// mailcast - real-time email delivery status broadcaster
#[derive(Parser, Debug)]
#[command(name = "mailcast-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on (e.g. 0.0.0.0:8080, localhost:8080 or :8080)
    listen: String,

    /// Optional TOML configuration file
    #[arg(short, long, env = "MAILCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting mailcast-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(args.config.as_deref(), args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let server_config = loaded_config.server.clone();
    let channels = Arc::new(ChannelRegistry::new(loaded_config.broadcast));
    tracing::info!(
        max_event_age = ?loaded_config.broadcast.max_event_age,
        "Configuration loaded"
    );
    let shared_config = loaded_config.into_shared();

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn the receipt write-back processor
    let (status_tx, status_rx) = status_update_channel();
    let status_writer = StatusWriter::new(
        Arc::new(DatabaseProcessor {
            pool: db_pool.clone(),
        }),
        status_rx,
        shutdown_rx.clone(),
    );
    let status_writer_handle = tokio::spawn(status_writer.run());

    // Create application state
    let state = AppState::new(channels, shared_config.clone(), status_tx, shutdown_rx);

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(shared_config, config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", server_config.listen);
    let result = run_server(
        router,
        &server_config.listen,
        shutdown_tx,
        server_config.shutdown_grace,
    )
    .await;

    // Signal the config reload handler to stop
    reload_notify.notify_one();

    // Exits on the shutdown signal, or once every sender is dropped.
    if let Err(e) = status_writer_handle.await {
        tracing::error!(error = %e, "StatusWriter task failed");
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
