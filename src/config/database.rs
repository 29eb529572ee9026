use migration::{MigratorTrait, RbacMigrator};
use sea_orm::{Database, DatabaseConnection};

use crate::errors::InternalError;

/// Connect to the database
///
/// Does NOT run migrations - call `migrate_database()` separately.
///
/// # Returns
/// * `Ok(DatabaseConnection)` - Connection established successfully
/// * `Err(InternalError)` - Connection failed
pub async fn init_database(database_url: &str) -> Result<DatabaseConnection, InternalError> {
    let db = Database::connect(database_url)
        .await
        .map_err(|e| InternalError::database("connect_database", e))?;

    tracing::debug!("Connected to database: {}", database_url);

    Ok(db)
}

/// Apply all pending schema migrations
pub async fn migrate_database(db: &DatabaseConnection) -> Result<(), InternalError> {
    RbacMigrator::up(db, None)
        .await
        .map_err(|e| InternalError::database("migrate_database", e))?;

    tracing::info!("Database migrations completed");
    Ok(())
}
