// Common test utilities for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use migration::{MigratorTrait, RbacMigrator};
use rolekeeper_backend::AppData;
use rolekeeper_backend::config::Settings;
use rolekeeper_backend::providers::{KeyManager, SymmetricKey};
use sea_orm::{Database, DatabaseConnection};

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    RbacMigrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// AppData over a fresh database with a fixed in-memory token key
pub async fn setup_app_data() -> Arc<AppData> {
    let key = SymmetricKey::from_bytes(&[0x5A; 32]).expect("Failed to build test key");
    setup_app_data_with_keys(Arc::new(KeyManager::from_key(key))).await
}

/// AppData whose token key lives in `key_file`
pub async fn setup_app_data_with_key_file(key_file: &Path) -> Arc<AppData> {
    setup_app_data_with_keys(Arc::new(KeyManager::new(key_file))).await
}

pub async fn setup_app_data_with_keys(key_manager: Arc<KeyManager>) -> Arc<AppData> {
    let db = setup_test_db().await;
    let app_data = AppData::with_key_manager(db, &Settings::default(), key_manager)
        .expect("Failed to build AppData");
    Arc::new(app_data)
}
