use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::{init_database, migrate_database, Settings};
use crate::errors::InternalError;
use crate::providers::{AuthorizationProvider, CredentialHasher, KeyManager, TokenCodec};
use crate::stores::{AssociationStore, PermissionStore, RoleStore, UserStore};

/// Centralized application data following the main-owned stores pattern
///
/// All dependencies are created once and shared across coordinators.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init(&settings)
///   ↓ creates once
///   ├─ db (DatabaseConnection)
///   ├─ user_store / role_store / permission_store / association_store
///   ├─ credential_hasher (pepper from settings)
///   ├─ key_manager (key file from settings)
///   ├─ token_codec (over key_manager)
///   └─ authorization_provider (over association_store)
///   ↓ wrapped in Arc<AppData>
///   ↓ passed to coordinators
///   ├─ IdentityCoordinator::new(app_data)
///   ├─ RoleCoordinator / PermissionCoordinator::new(app_data)
///   └─ AssociationCoordinator::new(app_data)
/// ```
pub struct AppData {
    pub db: DatabaseConnection,
    pub user_store: Arc<UserStore>,
    pub role_store: Arc<RoleStore>,
    pub permission_store: Arc<PermissionStore>,
    pub association_store: Arc<AssociationStore>,
    pub credential_hasher: Arc<CredentialHasher>,
    pub key_manager: Arc<KeyManager>,
    pub token_codec: Arc<TokenCodec>,
    pub authorization_provider: Arc<AuthorizationProvider>,
}

impl AppData {
    /// Connect, migrate and wire every component
    ///
    /// # Errors
    ///
    /// Returns `InternalError` when the database is unreachable, a migration
    /// fails, or the configured pepper is rejected
    pub async fn init(settings: &Settings) -> Result<Self, InternalError> {
        tracing::info!("Initializing AppData...");

        let db = init_database(settings.database_url()).await?;
        migrate_database(&db).await?;

        let key_manager = Arc::new(KeyManager::new(settings.token_key_file()));
        Self::with_key_manager(db, settings, key_manager)
    }

    /// Wire components over an existing connection and key manager
    pub fn with_key_manager(
        db: DatabaseConnection,
        settings: &Settings,
        key_manager: Arc<KeyManager>,
    ) -> Result<Self, InternalError> {
        tracing::debug!("Creating stores...");
        let user_store = Arc::new(UserStore::new());
        let role_store = Arc::new(RoleStore::new());
        let permission_store = Arc::new(PermissionStore::new());
        let association_store = Arc::new(AssociationStore::new());

        tracing::debug!("Creating providers...");
        let credential_hasher = Arc::new(CredentialHasher::new(
            settings.password_pepper().map(str::to_string),
        )?);
        let token_codec = Arc::new(TokenCodec::new(Arc::clone(&key_manager)));
        let authorization_provider = Arc::new(AuthorizationProvider::new(
            db.clone(),
            Arc::clone(&association_store),
        ));

        tracing::info!("AppData initialized");
        Ok(Self {
            db,
            user_store,
            role_store,
            permission_store,
            association_store,
            credential_hasher,
            key_manager,
            token_codec,
            authorization_provider,
        })
    }
}
