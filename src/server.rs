use axum::{routing::get, Router};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    api::handler::{get_status, health_check, AppState},
    error::AppResult,
};

pub fn create_app(state: AppState) -> Router {
    info!("⚙️ Setting up status routes...");

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        // Add request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("✓ Status routes configured");
    app
}

/// Serve until `shutdown` turns true
pub async fn run_server(
    app: Router,
    bind_address: &str,
    mut shutdown: watch::Receiver<bool>,
) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Status API listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    info!("🛑 Status API stopped");
    Ok(())
}
