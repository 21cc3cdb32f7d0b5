use storefront_core::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_core=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let conn = create_orm_conn(&config.database_url).await?;
    run_migrations(&conn, &config.migrations_dir).await?;
    tracing::info!(dir = %config.migrations_dir, "migrations applied");
    Ok(())
}
