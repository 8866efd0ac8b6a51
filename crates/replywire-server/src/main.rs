//! ReplyWire — page-watch, relay, and auto-reply controller.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("REPLYWIRE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn resolve_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3010)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let state = Arc::new(AppState::new(&data_dir)?);
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", resolve_port());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ReplyWire controller listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
