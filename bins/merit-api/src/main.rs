mod config;
mod routes;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

use merit_engine::ReputationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReputationService>,
    pub started: Instant,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let service = Arc::new(ReputationService::open(config.engine.clone())?);

    info!(
        bind = %config.bind_addr,
        backend = ?config.engine.backend,
        "Starting merit-api"
    );

    let state = AppState { service, started: Instant::now() };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Merit API listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
