//! HTTP adapter over the calculator operations.

mod handlers;
mod routes;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tracing::info;

/// Default listen address when neither `--bind` nor `LOAN_ENGINE_BIND` is set.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Full application router.
pub fn app() -> Router {
    Router::new()
        .route("/health", get(|| async { "Loan engine is running" }))
        .merge(routes::calculator_routes())
}

pub async fn run_server(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "loan engine listening");
    axum::serve(listener, app()).await?;
    Ok(())
}
