use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clipflow::PipelineConfig;
use clipflow::database::{self, MaintenanceScheduler};
use clipflow::database::repositories::SqlxPublishQueueRepository;
use clipflow::utils::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipflow=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = PipelineConfig::from_env()?;

    // Initialize database
    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let clock = Arc::new(SystemClock);
    let queue = Arc::new(SqlxPublishQueueRepository::new(pool.clone(), clock));

    // Retention maintenance runs until shutdown; dispatch is driven by the
    // deployment's dispatcher process through the library API.
    let maintenance = Arc::new(MaintenanceScheduler::new(
        pool,
        queue,
        config.maintenance.clone(),
    ));
    let handle = maintenance.clone().start();

    tracing::info!("clipflow initialized successfully");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    maintenance.stop();
    handle.abort();

    Ok(())
}
