//! lift-telemetry-bridge binary
//!
//! Runs the poller until Ctrl-C and logs every device snapshot it emits.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lift_telemetry_bridge::config::Config;
use lift_telemetry_bridge::upstream::{build_http_client, ApiClient, Fetcher};
use lift_telemetry_bridge::{PollingScheduler, SnapshotBuilder, TokenCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lift_telemetry_bridge=info".into()),
        )
        .init();

    tracing::info!("Starting lift-telemetry-bridge...");

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded (upstream: {})", config.api.base_url);

    // One HTTP client shared by the token exchange and data calls
    let http_client = build_http_client(config.api.timeout())?;
    let tokens = Arc::new(TokenCache::new(config.auth.clone(), http_client.clone()));
    let fetcher: Arc<dyn Fetcher> = Arc::new(ApiClient::new(http_client, tokens));

    let builder = Arc::new(SnapshotBuilder::new(fetcher, &config.api)?);
    let poller = Arc::new(PollingScheduler::new(builder, config.poller.interval()));

    poller.set_on_data(|device| match serde_json::to_string(&device) {
        Ok(json) => tracing::info!("[Device {}] {}", device.id, json),
        Err(e) => tracing::warn!("[Device {}] Serialization failed: {}", device.id, e),
    });
    poller.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    poller.stop();

    Ok(())
}
