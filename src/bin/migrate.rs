//! Apply the SQL migrations. With `--backfill-model-names`, also split car
//! models imported with the whole name in `base_model`.

use autoparts_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    services::compatibility_service,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let backfill = std::env::args().any(|arg| arg == "--backfill-model-names");

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, 1).await?;
    let orm = orm_from_pool(&pool);
    run_migrations(&orm).await?;
    tracing::info!("migrations applied");

    if backfill {
        let split = compatibility_service::backfill_model_names(&orm).await?;
        tracing::info!(split, "car model names backfilled");
    }
    Ok(())
}
