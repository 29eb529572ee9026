// Test utilities shared across unit tests
// Only compiled when running tests

use std::sync::Arc;

use migration::{MigratorTrait, RbacMigrator};
use sea_orm::{Database, DatabaseConnection};

use crate::app_data::AppData;
use crate::config::Settings;
use crate::providers::{KeyManager, SymmetricKey};

/// Fresh in-memory database with the full schema applied
pub async fn setup_test_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    RbacMigrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Fixed key so tests never touch the filesystem
pub fn test_key_manager() -> Arc<KeyManager> {
    let key = SymmetricKey::from_bytes(&[0x42; 32]).expect("Failed to build test key");
    Arc::new(KeyManager::from_key(key))
}

/// AppData over a migrated in-memory database and an in-memory key
///
/// Returns (db, app_data). The database handle is the same pool AppData uses.
pub async fn setup_test_app_data() -> (DatabaseConnection, Arc<AppData>) {
    let db = setup_test_database().await;
    let settings = Settings::default();
    let app_data = AppData::with_key_manager(db.clone(), &settings, test_key_manager())
        .expect("Failed to build AppData");
    (db, Arc::new(app_data))
}
