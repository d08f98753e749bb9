use anyhow::{Context, Result};
use contexta::config::PipelineConfig;
use contexta::store::ContextStore;
use provider_manager::orchestrator::{FetchOrchestrator, RetryPolicy};
use provider_manager::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "provider_manager=info,contexta=info".into()),
        )
        .init();

    info!("Provider Manager starting...");

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    info!(
        database = %config.database_path,
        fetch_interval_secs = config.fetch_interval_secs,
        max_attempts = config.max_attempts,
        "Configuration loaded"
    );

    let store = Arc::new(
        ContextStore::new(&config.database_path, &config.encryption_key)
            .context("Failed to initialize store")?,
    );
    info!("Store initialized");

    let registry = Arc::new(Registry::builtin());
    let orchestrator = FetchOrchestrator::new(
        Arc::clone(&store),
        registry,
        RetryPolicy::from_config(&config),
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.fetch_interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = orchestrator.run().await;
                info!(
                    state = %report.state,
                    attempts = report.attempts,
                    records_imported = report.records_imported,
                    status = %report.status,
                    "Run finished"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, exiting");
                break;
            }
        }
    }

    Ok(())
}
