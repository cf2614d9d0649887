use crate::error::Result;
use hakone_migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub async fn setup_database(database_url: &str) -> Result<DatabaseConnection> {
    tracing::info!("🔗 Connecting to database: {}", database_url);

    // Configure connection options
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    migrate(&db).await?;

    Ok(db)
}

/// Fresh, migrated in-memory SQLite database.
///
/// Every pooled connection to `sqlite::memory:` opens its own database,
/// so the pool is pinned to a single long-lived connection.
pub async fn connect_in_memory() -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    migrate(&db).await?;

    Ok(db)
}

async fn migrate(db: &DatabaseConnection) -> Result<()> {
    tracing::info!("🔄 Running database migrations...");
    Migrator::up(db, None).await?;
    tracing::info!("✅ Migrations completed successfully");
    Ok(())
}
