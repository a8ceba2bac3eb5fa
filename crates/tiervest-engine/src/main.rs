//! Tiervest engine daemon.
//!
//! Opens the store and drives the daily job chain (schedule refresh,
//! settlement, balance snapshots) until shut down.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiervest_engine::{EngineConfig, JobRunner};
use tiervest_store::RocksStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tiervest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tiervest engine");

    let config = EngineConfig::from_env();
    tracing::info!(
        data_dir = %config.data_dir,
        settlement_hour_utc = config.settlement_hour_utc,
        "Engine configuration loaded"
    );

    let store = Arc::new(RocksStore::open(&config.data_dir)?);
    let runner = JobRunner::new(store);

    tokio::select! {
        () = runner.run_forever(&config) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
