//! repo-inteld: serve the repository intelligence HTTP API.

use anyhow::{Context, Result};
use repo_intel_core::{init_from_settings, RepoIntel, Settings};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("invalid settings")?;
    init_from_settings(&settings);

    let bind_addr = settings.bind_addr;
    let app = RepoIntel::from_settings(settings)
        .await
        .context("failed to initialise services")?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let local_addr = listener.local_addr()?;
    info!("Starting Repository Intelligence Backend on http://{local_addr}");
    info!("Health endpoint: http://{local_addr}/api/v1/health");

    axum::serve(listener, repo_intel_server::router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
