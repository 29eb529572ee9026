use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::coordinators::TransactionCoordinator;
use crate::errors::{InternalError, ServiceError};
use crate::stores::{AssociationStore, PermissionStore};
use crate::types::internal::validate::require_id;
use crate::types::{NewPermission, PageRequest, Permission};

pub struct PermissionCoordinator {
    db: DatabaseConnection,
    permission_store: Arc<PermissionStore>,
    association_store: Arc<AssociationStore>,
}

impl PermissionCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            permission_store: Arc::clone(&app_data.permission_store),
            association_store: Arc::clone(&app_data.association_store),
        }
    }

    /// Names are stored trimmed and lower-cased
    pub async fn create_permission(&self, name: &str) -> Result<Permission, ServiceError> {
        let new_permission = NewPermission::new(name)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "create_permission").await?;
        let result = self.permission_store.insert(tx.connection()?, &new_permission).await;
        let permission = tx.finish(result).await?;

        tracing::info!(permission_id = permission.id, name = %permission.name, "Permission created");
        Ok(permission)
    }

    pub async fn get_permission(&self, id: u64) -> Result<Permission, ServiceError> {
        require_id("permission_id", id)?;
        self.permission_store
            .find_by_id(&self.db, id)
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("permission", id)))
            .map_err(|e| ServiceError::from_internal("get_permission", e))
    }

    pub async fn get_permission_by_name(&self, name: &str) -> Result<Permission, ServiceError> {
        let name = NewPermission::new(name)?;
        self.permission_store
            .find_by_name(&self.db, name.name())
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("permission", name.name())))
            .map_err(|e| ServiceError::from_internal("get_permission_by_name", e))
    }

    pub async fn update_permission(&self, id: u64, name: &str) -> Result<Permission, ServiceError> {
        require_id("permission_id", id)?;
        let fields = NewPermission::new(name)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "update_permission").await?;
        let result = self.permission_store.update(tx.connection()?, id, &fields).await;
        tx.finish(result).await
    }

    /// Delete a permission and unlink it from every role
    pub async fn delete_permission(&self, id: u64) -> Result<(), ServiceError> {
        let db_id = require_id("permission_id", id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "delete_permission").await?;
        let conn = tx.connection()?;
        let result: Result<u64, InternalError> = async {
            if self.permission_store.find_by_id(conn, id).await?.is_none() {
                return Err(InternalError::not_found("permission", id));
            }
            let links = self.association_store.delete_permission_links(conn, db_id).await?;
            self.permission_store.delete(conn, id).await?;
            Ok(links)
        }
        .await;
        let links = tx.finish(result).await?;

        tracing::info!(permission_id = id, removed_links = links, "Permission deleted");
        Ok(())
    }

    pub async fn list_permissions(&self, page: PageRequest) -> Result<Vec<Permission>, ServiceError> {
        self.permission_store
            .list(&self.db, page)
            .await
            .map_err(|e| ServiceError::from_internal("list_permissions", e))
    }

    pub async fn count_permissions(&self) -> Result<u64, ServiceError> {
        self.permission_store
            .count(&self.db)
            .await
            .map_err(|e| ServiceError::from_internal("count_permissions", e))
    }
}
