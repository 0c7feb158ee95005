mod config;
mod error;
mod mysql;
mod render;
mod routes;
mod row_dump;
mod session;
mod state;
#[cfg(test)]
mod testing;

use config::Config;
use state::AppState;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = config::config_path(|key| std::env::var(key).ok());
    let cfg = Config::from_file(&path)?;
    info!(config = %path, "Loaded configuration");

    serve(cfg).await
}

async fn serve(cfg: Config) -> anyhow::Result<()> {
    let route = routes::mount_path(cfg.route.as_deref())?;
    let addr: SocketAddr = cfg.listen.as_deref().unwrap_or(DEFAULT_LISTEN).parse()?;
    let state = Arc::new(AppState::from_config(&cfg)?);

    info!(%addr, %route, "Starting row-dump");
    axum::Server::bind(&addr)
        .serve(routes::router(&route, state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
