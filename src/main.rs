use std::sync::Arc;

use lantern::config::Config;
use lantern::error::ShutdownReason;
use lantern::log::TracingSink;
use lantern::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let server = Arc::new(Server::new(cfg, Arc::new(TracingSink)));
    server.start()?;

    tokio::select! {
        _ = server.stopped() => {
            tracing::warn!("Server stopped on its own");
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            server.shutdown(ShutdownReason::Requested).await;
        }
    }

    Ok(())
}
