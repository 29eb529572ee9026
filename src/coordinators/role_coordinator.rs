use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::coordinators::TransactionCoordinator;
use crate::errors::{InternalError, ServiceError};
use crate::stores::{AssociationStore, RoleStore};
use crate::types::internal::validate::require_id;
use crate::types::{NewRole, PageRequest, Role};

pub struct RoleCoordinator {
    db: DatabaseConnection,
    role_store: Arc<RoleStore>,
    association_store: Arc<AssociationStore>,
}

impl RoleCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            role_store: Arc::clone(&app_data.role_store),
            association_store: Arc::clone(&app_data.association_store),
        }
    }

    pub async fn create_role(&self, name: &str) -> Result<Role, ServiceError> {
        let new_role = NewRole::new(name)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "create_role").await?;
        let result = self.role_store.insert(tx.connection()?, &new_role).await;
        let role = tx.finish(result).await?;

        tracing::info!(role_id = role.id, name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn get_role(&self, id: u64) -> Result<Role, ServiceError> {
        require_id("role_id", id)?;
        self.role_store
            .find_by_id(&self.db, id)
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("role", id)))
            .map_err(|e| ServiceError::from_internal("get_role", e))
    }

    pub async fn get_role_by_name(&self, name: &str) -> Result<Role, ServiceError> {
        let name = NewRole::new(name)?;
        self.role_store
            .find_by_name(&self.db, name.name())
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("role", name.name())))
            .map_err(|e| ServiceError::from_internal("get_role_by_name", e))
    }

    pub async fn update_role(&self, id: u64, name: &str) -> Result<Role, ServiceError> {
        require_id("role_id", id)?;
        let fields = NewRole::new(name)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "update_role").await?;
        let result = self.role_store.update(tx.connection()?, id, &fields).await;
        tx.finish(result).await
    }

    /// Delete a role and every user and permission link that references it
    pub async fn delete_role(&self, id: u64) -> Result<(), ServiceError> {
        let db_id = require_id("role_id", id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "delete_role").await?;
        let conn = tx.connection()?;
        let result: Result<u64, InternalError> = async {
            if self.role_store.find_by_id(conn, id).await?.is_none() {
                return Err(InternalError::not_found("role", id));
            }
            let links = self.association_store.delete_role_links(conn, db_id).await?;
            self.role_store.delete(conn, id).await?;
            Ok(links)
        }
        .await;
        let links = tx.finish(result).await?;

        tracing::info!(role_id = id, removed_links = links, "Role deleted");
        Ok(())
    }

    pub async fn list_roles(&self, page: PageRequest) -> Result<Vec<Role>, ServiceError> {
        self.role_store
            .list(&self.db, page)
            .await
            .map_err(|e| ServiceError::from_internal("list_roles", e))
    }

    pub async fn count_roles(&self) -> Result<u64, ServiceError> {
        self.role_store
            .count(&self.db)
            .await
            .map_err(|e| ServiceError::from_internal("count_roles", e))
    }
}
