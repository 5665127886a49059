//! Policy repository setup
//!
//! PostgreSQL when `DATABASE_URL` is set and the `postgres` feature is on,
//! otherwise the in-memory repository.

use anyhow::Result;
use photovault_core::Config;
use photovault_db::{AclPolicyRepository, InMemoryAclPolicyRepository};
use std::sync::Arc;

#[cfg(feature = "postgres")]
pub async fn setup_policy_repository(config: &Config) -> Result<Arc<dyn AclPolicyRepository>> {
    match config.database_url() {
        Some(url) => {
            let pool = setup_database(config, url).await?;
            Ok(Arc::new(photovault_db::PostgresAclPolicyRepository::new(pool)))
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory ACL policies");
            Ok(Arc::new(InMemoryAclPolicyRepository::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
pub async fn setup_policy_repository(config: &Config) -> Result<Arc<dyn AclPolicyRepository>> {
    if config.database_url().is_some() {
        tracing::warn!(
            "DATABASE_URL is set but the postgres feature is not enabled, using in-memory ACL policies"
        );
    } else {
        tracing::info!("Using in-memory ACL policies");
    }
    Ok(Arc::new(InMemoryAclPolicyRepository::new()))
}

/// Setup database connection pool and run migrations
#[cfg(feature = "postgres")]
async fn setup_database(config: &Config, url: &str) -> Result<sqlx::PgPool> {
    use anyhow::Context;
    use sqlx::postgres::PgPoolOptions;
    use std::path::Path;
    use std::time::Duration;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    // Workspace migrations/ relative to the crate root
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
