use anyhow::{Context, Result};
use health_insight_composer::{router, AppState, Composer, ServiceConfig};
use health_insight_ingestion::{JsonDayStore, JsonEventLog, SnapshotFile};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Health Insight Service v{}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::from_env();
    info!("Data directory: {}", config.data_dir.display());
    info!("Thresholds: {:?}", config.thresholds);

    let store = JsonDayStore::open(&config.data_dir).with_context(|| {
        format!("failed to open record store in {}", config.data_dir.display())
    })?;
    let events = JsonEventLog::open(&config.data_dir);
    let composer = Composer::new(store, events, config.thresholds.clone())
        .with_snapshot(SnapshotFile::open(&config.data_dir));

    let app = router(AppState::new(composer));

    info!("Starting HTTP server on http://{}", config.bind_addr);
    info!("Briefing endpoint: http://{}/briefing/:date", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    axum::serve(listener, app).await?;

    Ok(())
}
