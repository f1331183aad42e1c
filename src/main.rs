mod api;
mod attestation;
mod bootstrap;
mod config;
mod error;
mod fulfillment;
mod jobs;
mod ledger;
mod scheduler;
mod server;
mod signer;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,fulfiller=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    dotenv::dotenv().ok();

    // Initialize tracing
    init_tracing();

    info!("🚀 Starting off-chain job fulfiller");

    let config = config::Config::from_env().map_err(error::AppError::from)?;
    let service = bootstrap::initialize_service(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Optional status API
    let server_handle = config.status_bind_address.clone().map(|bind_address| {
        let app = server::create_app(service.state.clone());
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = server::run_server(app, &bind_address, shutdown).await {
                error!("❌ Status API failed: {}", e);
            }
        })
    });

    let scheduler_handle = service.scheduler.clone().start(shutdown_rx);
    info!("🔄 Fulfillment loop started");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, finishing current tick ...");
    shutdown_tx.send(true)?;

    scheduler_handle.await?;
    if let Some(handle) = server_handle {
        handle.await?;
    }

    info!("👋 Fulfiller stopped");
    Ok(())
}
