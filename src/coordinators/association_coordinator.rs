use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::app_data::AppData;
use crate::coordinators::TransactionCoordinator;
use crate::errors::{InternalError, ServiceError};
use crate::stores::{AssociationStore, PermissionStore, RoleStore, UserStore};
use crate::types::internal::rbac::sanitize_role_query;
use crate::types::internal::validate::{require_id, require_ids};
use crate::types::{AssignOutcome, Permission, Role};

/// Creates and removes User-Role and Role-Permission links
///
/// Every mutation runs in its own transaction: ids are checked before it
/// opens, referenced rows are looked up inside it, and the first failure
/// rolls back the whole call. Reads use the pool directly.
pub struct AssociationCoordinator {
    db: DatabaseConnection,
    user_store: Arc<UserStore>,
    role_store: Arc<RoleStore>,
    permission_store: Arc<PermissionStore>,
    association_store: Arc<AssociationStore>,
}

impl AssociationCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            user_store: Arc::clone(&app_data.user_store),
            role_store: Arc::clone(&app_data.role_store),
            permission_store: Arc::clone(&app_data.permission_store),
            association_store: Arc::clone(&app_data.association_store),
        }
    }

    pub async fn assign_permission_to_role(
        &self,
        role_id: u64,
        permission_id: u64,
    ) -> Result<AssignOutcome, ServiceError> {
        let role_id = require_id("role_id", role_id)?;
        let permission_id = require_id("permission_id", permission_id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "assign_permission_to_role").await?;
        let result = self.link_permission(tx.connection()?, role_id, permission_id).await;
        tx.finish(result).await
    }

    pub async fn remove_permission_from_role(&self, role_id: u64, permission_id: u64) -> Result<(), ServiceError> {
        let role_id = require_id("role_id", role_id)?;
        let permission_id = require_id("permission_id", permission_id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "remove_permission_from_role").await?;
        let result = self.unlink_permission(tx.connection()?, role_id, permission_id).await;
        tx.finish(result).await
    }

    /// Link several permissions to one role, all or nothing
    ///
    /// # Returns
    /// One outcome per requested id, in request order
    pub async fn add_multiple_permissions_to_role(
        &self,
        role_id: u64,
        permission_ids: &[u64],
    ) -> Result<Vec<AssignOutcome>, ServiceError> {
        let role_id = require_id("role_id", role_id)?;
        let permission_ids = require_ids("permission_ids", permission_ids)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "add_multiple_permissions_to_role").await?;
        let conn = tx.connection()?;
        let result: Result<Vec<AssignOutcome>, InternalError> = async {
            let mut outcomes = Vec::with_capacity(permission_ids.len());
            for permission_id in &permission_ids {
                outcomes.push(self.link_permission(conn, role_id, *permission_id).await?);
            }
            Ok(outcomes)
        }
        .await;
        tx.finish(result).await
    }

    pub async fn remove_multiple_permissions_from_role(
        &self,
        role_id: u64,
        permission_ids: &[u64],
    ) -> Result<(), ServiceError> {
        let role_id = require_id("role_id", role_id)?;
        let permission_ids = require_ids("permission_ids", permission_ids)?;

        let mut tx =
            TransactionCoordinator::start(self.db.clone(), "remove_multiple_permissions_from_role").await?;
        let conn = tx.connection()?;
        let result: Result<(), InternalError> = async {
            for permission_id in &permission_ids {
                self.unlink_permission(conn, role_id, *permission_id).await?;
            }
            Ok(())
        }
        .await;
        tx.finish(result).await
    }

    pub async fn add_user_role(&self, user_id: u64, role_id: u64) -> Result<AssignOutcome, ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        let role_id = require_id("role_id", role_id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "add_user_role").await?;
        let result = self.link_role(tx.connection()?, user_id, role_id).await;
        tx.finish(result).await
    }

    pub async fn remove_user_role(&self, user_id: u64, role_id: u64) -> Result<(), ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        let role_id = require_id("role_id", role_id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "remove_user_role").await?;
        let result = self.unlink_role(tx.connection()?, user_id, role_id).await;
        tx.finish(result).await
    }

    pub async fn add_multiple_roles_to_user(
        &self,
        user_id: u64,
        role_ids: &[u64],
    ) -> Result<Vec<AssignOutcome>, ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        let role_ids = require_ids("role_ids", role_ids)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "add_multiple_roles_to_user").await?;
        let conn = tx.connection()?;
        let result: Result<Vec<AssignOutcome>, InternalError> = async {
            let mut outcomes = Vec::with_capacity(role_ids.len());
            for role_id in &role_ids {
                outcomes.push(self.link_role(conn, user_id, *role_id).await?);
            }
            Ok(outcomes)
        }
        .await;
        tx.finish(result).await
    }

    pub async fn remove_multiple_roles_from_user(&self, user_id: u64, role_ids: &[u64]) -> Result<(), ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        let role_ids = require_ids("role_ids", role_ids)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "remove_multiple_roles_from_user").await?;
        let conn = tx.connection()?;
        let result: Result<(), InternalError> = async {
            for role_id in &role_ids {
                self.unlink_role(conn, user_id, *role_id).await?;
            }
            Ok(())
        }
        .await;
        tx.finish(result).await
    }

    pub async fn get_permissions_by_role_id(&self, role_id: u64) -> Result<Vec<Permission>, ServiceError> {
        let role_id = require_id("role_id", role_id)?;
        self.association_store
            .permissions_for_role(&self.db, role_id)
            .await
            .map_err(|e| ServiceError::from_internal("get_permissions_by_role_id", e))
    }

    pub async fn get_roles_by_permission_id(&self, permission_id: u64) -> Result<Vec<Role>, ServiceError> {
        let permission_id = require_id("permission_id", permission_id)?;
        self.association_store
            .roles_for_permission(&self.db, permission_id)
            .await
            .map_err(|e| ServiceError::from_internal("get_roles_by_permission_id", e))
    }

    pub async fn get_roles_by_user_id(&self, user_id: u64) -> Result<Vec<Role>, ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        self.association_store
            .roles_for_user(&self.db, user_id)
            .await
            .map_err(|e| ServiceError::from_internal("get_roles_by_user_id", e))
    }

    /// Role name must be at least two characters after trimming
    pub async fn user_has_role(&self, user_id: u64, role_name: &str) -> Result<bool, ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        let role_name = sanitize_role_query(role_name)?;
        self.association_store
            .user_has_role(&self.db, user_id, &role_name)
            .await
            .map_err(|e| ServiceError::from_internal("user_has_role", e))
    }

    // Ids below are storage integers already checked by the public entry points

    async fn link_permission(
        &self,
        conn: &impl ConnectionTrait,
        role_id: i64,
        permission_id: i64,
    ) -> Result<AssignOutcome, InternalError> {
        self.require_role(conn, role_id).await?;
        self.require_permission(conn, permission_id).await?;

        let outcome = self
            .association_store
            .insert_role_permission(conn, role_id, permission_id)
            .await?;
        tracing::debug!(role_id, permission_id, ?outcome, "Permission linked to role");
        Ok(outcome)
    }

    async fn unlink_permission(
        &self,
        conn: &impl ConnectionTrait,
        role_id: i64,
        permission_id: i64,
    ) -> Result<(), InternalError> {
        self.require_role(conn, role_id).await?;
        self.require_permission(conn, permission_id).await?;

        let removed = self
            .association_store
            .delete_role_permission(conn, role_id, permission_id)
            .await?;
        if !removed {
            return Err(InternalError::not_found(
                "role_permission",
                format!("role {} / permission {}", role_id, permission_id),
            ));
        }
        tracing::debug!(role_id, permission_id, "Permission unlinked from role");
        Ok(())
    }

    async fn link_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i64,
        role_id: i64,
    ) -> Result<AssignOutcome, InternalError> {
        self.require_user(conn, user_id).await?;
        self.require_role(conn, role_id).await?;

        let outcome = self.association_store.insert_user_role(conn, user_id, role_id).await?;
        tracing::debug!(user_id, role_id, ?outcome, "Role linked to user");
        Ok(outcome)
    }

    async fn unlink_role(&self, conn: &impl ConnectionTrait, user_id: i64, role_id: i64) -> Result<(), InternalError> {
        self.require_user(conn, user_id).await?;
        self.require_role(conn, role_id).await?;

        let removed = self.association_store.delete_user_role(conn, user_id, role_id).await?;
        if !removed {
            return Err(InternalError::not_found(
                "user_role",
                format!("user {} / role {}", user_id, role_id),
            ));
        }
        tracing::debug!(user_id, role_id, "Role unlinked from user");
        Ok(())
    }

    async fn require_user(&self, conn: &impl ConnectionTrait, user_id: i64) -> Result<(), InternalError> {
        if self.user_store.exists(conn, user_id).await? {
            Ok(())
        } else {
            Err(InternalError::not_found("user", user_id))
        }
    }

    async fn require_role(&self, conn: &impl ConnectionTrait, role_id: i64) -> Result<(), InternalError> {
        if self.role_store.exists(conn, role_id).await? {
            Ok(())
        } else {
            Err(InternalError::not_found("role", role_id))
        }
    }

    async fn require_permission(&self, conn: &impl ConnectionTrait, permission_id: i64) -> Result<(), InternalError> {
        if self.permission_store.exists(conn, permission_id).await? {
            Ok(())
        } else {
            Err(InternalError::not_found("permission", permission_id))
        }
    }
}
