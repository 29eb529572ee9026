use crate::config::{init_database, migrate_database, Settings};

/// Run database migrations
///
/// Connects to the configured database and runs all pending migrations.
/// It does not initialize the full AppData structure.
pub async fn run_migrations(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    let db = init_database(settings.database_url()).await?;
    migrate_database(&db).await?;

    println!("Migrations applied to {}", settings.database_url());
    Ok(())
}
