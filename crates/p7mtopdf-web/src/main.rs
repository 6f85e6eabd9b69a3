use std::net::SocketAddr;
use std::sync::Arc;

use p7mtopdf_core::{Config, config_file};
use tracing_subscriber::EnvFilter;

mod handlers;
mod models;
mod routes;
mod state;
mod template;
mod upload;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // Resolve configuration: env vars > config files > defaults
    let mut config = Config::from_file(&config_file::load_config());
    if let Ok(bind) = std::env::var("P7MTOPDF_BIND") {
        config.bind = bind;
    }

    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", config.bind, e))?;

    tracing::info!(
        suffix = %config.container_suffix,
        max_upload_mb = config.max_upload_size / 1024 / 1024,
        "starting server"
    );

    let app = routes::router(Arc::new(AppState { config }));

    tracing::info!("Listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
    }
}
