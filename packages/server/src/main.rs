use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use common::gateway::OpenAiGateway;
use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let gateway =
        OpenAiGateway::new(config.gateway.clone()).context("Failed to build gateway client")?;
    let state = AppState::new(config.clone(), Arc::new(gateway));

    // Start from an empty staging area; any batch from a previous run is
    // stale by definition.
    {
        let mut staging = state.staging.lock().await;
        staging
            .reset()
            .await
            .context("Failed to prepare staging directory")?;
    }

    let app = server::build_router(state);

    let host: IpAddr = config
        .server
        .host
        .parse()
        .context("Invalid server.host address")?;
    let addr = SocketAddr::new(host, config.server.port);
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
