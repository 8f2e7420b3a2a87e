//! tapssh relay daemon
//!
//! Runs SSH commands on behalf of clients that cannot open sessions themselves

use std::sync::Arc;

use color_eyre::Result;
use tapssh_exec::RusshTransport;
use tapssh_relay::{AppState, Config, create_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load_default()?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.relay.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let state = Arc::new(AppState::new(Arc::new(RusshTransport::new()), &config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.relay.bind).await?;
    info!(bind = %config.relay.bind, "tapssh relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
