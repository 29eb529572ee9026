use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::errors::{InternalError, ServiceError};
use crate::stores::AssociationStore;
use crate::types::internal::rbac::{sanitize_permission_query, sanitize_role_query};
use crate::types::internal::validate::require_id;
use crate::types::{Claims, Permission, Role};

/// Read-only membership checks over committed association state
///
/// Every call goes to the database. A check made right after a commit
/// observes that commit.
pub struct AuthorizationProvider {
    db: DatabaseConnection,
    association_store: Arc<AssociationStore>,
}

impl AuthorizationProvider {
    pub fn new(db: DatabaseConnection, association_store: Arc<AssociationStore>) -> Self {
        Self { db, association_store }
    }

    /// Whether the user holds a role with exactly this name
    ///
    /// # Errors
    /// `BadRequest` when the id is not positive or the trimmed role name is
    /// shorter than two characters
    pub async fn user_has_role(&self, user_id: u64, role_name: &str) -> Result<bool, ServiceError> {
        let operation = "user_has_role";
        let result: Result<bool, InternalError> = async {
            let user_id = require_id("user_id", user_id)?;
            let role_name = sanitize_role_query(role_name)?;
            self.association_store.user_has_role(&self.db, user_id, &role_name).await
        }
        .await;
        result.map_err(|e| ServiceError::from_internal(operation, e))
    }

    /// Whether any of the user's roles grants the permission
    pub async fn user_has_permission(&self, user_id: u64, permission_name: &str) -> Result<bool, ServiceError> {
        let operation = "user_has_permission";
        let result: Result<bool, InternalError> = async {
            let user_id = require_id("user_id", user_id)?;
            let permission_name = sanitize_permission_query(permission_name)?;
            self.association_store
                .user_has_permission(&self.db, user_id, &permission_name)
                .await
        }
        .await;
        result.map_err(|e| ServiceError::from_internal(operation, e))
    }

    pub async fn roles_for_user(&self, user_id: u64) -> Result<Vec<Role>, ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        self.association_store
            .roles_for_user(&self.db, user_id)
            .await
            .map_err(|e| ServiceError::from_internal("roles_for_user", e))
    }

    pub async fn permissions_for_user(&self, user_id: u64) -> Result<Vec<Permission>, ServiceError> {
        let user_id = require_id("user_id", user_id)?;
        self.association_store
            .permissions_for_user(&self.db, user_id)
            .await
            .map_err(|e| ServiceError::from_internal("permissions_for_user", e))
    }

    /// Guard for the subject of already-verified claims
    ///
    /// # Errors
    /// * `Unauthorized` - The claims name no valid subject
    /// * `Forbidden` - The subject lacks the permission
    pub async fn authorize(&self, claims: &Claims, permission_name: &str) -> Result<(), ServiceError> {
        let user_id = claims
            .subject_id()
            .ok_or_else(|| ServiceError::Unauthorized("token subject is not a user id".to_string()))?;

        if self.user_has_permission(user_id, permission_name).await? {
            Ok(())
        } else {
            tracing::warn!(user_id, permission = permission_name, "Permission denied");
            Err(ServiceError::Forbidden(format!(
                "user {} lacks permission '{}'",
                user_id,
                permission_name.trim().to_lowercase()
            )))
        }
    }
}
