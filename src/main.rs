use std::sync::Arc;

use confluence_mcp::{
    build_app,
    config::Config,
    confluence_client::{Credentials, HttpConfluenceClient},
    logging, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let client = Arc::new(HttpConfluenceClient::new(Credentials::from(&config)));
    let state = AppState::new(config.mcp_api_token.clone(), client);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(config.bind_socket()?).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "confluence mcp server starting"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }

    info!("shutdown signal received, stopping server");
}
