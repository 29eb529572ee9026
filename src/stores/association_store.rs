use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict, Query, SelectStatement};
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use crate::errors::InternalError;
use crate::types::db::{permission, role, role_permission, user_role};
use crate::types::{AssignOutcome, Permission, Role};

/// Join-row access for `user_roles` and `role_permissions`
///
/// Ids are the storage integers already checked by the caller. Existence of
/// the referenced rows is the caller's concern; the foreign keys only catch
/// what slips through.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssociationStore;

impl AssociationStore {
    pub fn new() -> Self {
        Self
    }

    /// Insert a (user, role) link unless it already exists
    ///
    /// The conflict is resolved by the primary key, so a concurrent insert of
    /// the same pair also ends as `AlreadyPresent`.
    pub async fn insert_user_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i64,
        role_id: i64,
    ) -> Result<AssignOutcome, InternalError> {
        let row = user_role::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            created_at: Set(Utc::now().timestamp()),
        };
        let result = user_role::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([user_role::Column::UserId, user_role::Column::RoleId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await;
        Self::classify_insert("insert_user_role", "user_role", &format!("{user_id}:{role_id}"), result)
    }

    /// # Returns
    /// * `Ok(true)` - The link existed and was removed
    /// * `Ok(false)` - There was no such link
    pub async fn delete_user_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, InternalError> {
        let result = user_role::Entity::delete_by_id((user_id, role_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user_role", e))?;
        Ok(result.rows_affected > 0)
    }

    pub async fn insert_role_permission(
        &self,
        conn: &impl ConnectionTrait,
        role_id: i64,
        permission_id: i64,
    ) -> Result<AssignOutcome, InternalError> {
        let row = role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            created_at: Set(Utc::now().timestamp()),
        };
        let result = role_permission::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([role_permission::Column::RoleId, role_permission::Column::PermissionId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await;
        Self::classify_insert(
            "insert_role_permission",
            "role_permission",
            &format!("{role_id}:{permission_id}"),
            result,
        )
    }

    pub async fn delete_role_permission(
        &self,
        conn: &impl ConnectionTrait,
        role_id: i64,
        permission_id: i64,
    ) -> Result<bool, InternalError> {
        let result = role_permission::Entity::delete_by_id((role_id, permission_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_role_permission", e))?;
        Ok(result.rows_affected > 0)
    }

    /// Remove every role link of a user, returning the number of rows removed
    pub async fn delete_user_links(&self, conn: &impl ConnectionTrait, user_id: i64) -> Result<u64, InternalError> {
        let result = user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user_links", e))?;
        Ok(result.rows_affected)
    }

    /// Remove both user and permission links of a role
    pub async fn delete_role_links(&self, conn: &impl ConnectionTrait, role_id: i64) -> Result<u64, InternalError> {
        let users = user_role::Entity::delete_many()
            .filter(user_role::Column::RoleId.eq(role_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_role_links", e))?;
        let permissions = role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_role_links", e))?;
        Ok(users.rows_affected + permissions.rows_affected)
    }

    pub async fn delete_permission_links(
        &self,
        conn: &impl ConnectionTrait,
        permission_id: i64,
    ) -> Result<u64, InternalError> {
        let result = role_permission::Entity::delete_many()
            .filter(role_permission::Column::PermissionId.eq(permission_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_permission_links", e))?;
        Ok(result.rows_affected)
    }

    pub async fn roles_for_user(&self, conn: &impl ConnectionTrait, user_id: i64) -> Result<Vec<Role>, InternalError> {
        let models = role::Entity::find()
            .inner_join(user_role::Entity)
            .filter(user_role::Column::UserId.eq(user_id))
            .order_by_asc(role::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("roles_for_user", e))?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    pub async fn roles_for_permission(
        &self,
        conn: &impl ConnectionTrait,
        permission_id: i64,
    ) -> Result<Vec<Role>, InternalError> {
        let models = role::Entity::find()
            .inner_join(role_permission::Entity)
            .filter(role_permission::Column::PermissionId.eq(permission_id))
            .order_by_asc(role::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("roles_for_permission", e))?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    pub async fn permissions_for_role(
        &self,
        conn: &impl ConnectionTrait,
        role_id: i64,
    ) -> Result<Vec<Permission>, InternalError> {
        let models = permission::Entity::find()
            .inner_join(role_permission::Entity)
            .filter(role_permission::Column::RoleId.eq(role_id))
            .order_by_asc(permission::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("permissions_for_role", e))?;
        Ok(models.into_iter().map(Permission::from).collect())
    }

    /// Permissions reachable through any of the user's roles, each listed once
    pub async fn permissions_for_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i64,
    ) -> Result<Vec<Permission>, InternalError> {
        let models = permission::Entity::find()
            .filter(permission::Column::Id.in_subquery(Self::permission_ids_for_user(user_id)))
            .order_by_asc(permission::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("permissions_for_user", e))?;
        Ok(models.into_iter().map(Permission::from).collect())
    }

    pub async fn user_has_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i64,
        role_name: &str,
    ) -> Result<bool, InternalError> {
        let matches = role::Entity::find()
            .inner_join(user_role::Entity)
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(role::Column::Name.eq(role_name))
            .count(conn)
            .await
            .map_err(|e| InternalError::database("user_has_role", e))?;
        Ok(matches > 0)
    }

    pub async fn user_has_permission(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i64,
        permission_name: &str,
    ) -> Result<bool, InternalError> {
        let matches = permission::Entity::find()
            .filter(permission::Column::Name.eq(permission_name))
            .filter(permission::Column::Id.in_subquery(Self::permission_ids_for_user(user_id)))
            .count(conn)
            .await
            .map_err(|e| InternalError::database("user_has_permission", e))?;
        Ok(matches > 0)
    }

    // SELECT rp.permission_id FROM role_permissions rp
    //   JOIN user_roles ur ON ur.role_id = rp.role_id WHERE ur.user_id = ?
    fn permission_ids_for_user(user_id: i64) -> SelectStatement {
        Query::select()
            .column((role_permission::Entity, role_permission::Column::PermissionId))
            .from(role_permission::Entity)
            .inner_join(
                user_role::Entity,
                Expr::col((user_role::Entity, user_role::Column::RoleId))
                    .equals((role_permission::Entity, role_permission::Column::RoleId)),
            )
            .and_where(Expr::col((user_role::Entity, user_role::Column::UserId)).eq(user_id))
            .to_owned()
    }

    fn classify_insert(
        operation: &str,
        entity: &'static str,
        key: &str,
        result: Result<u64, sea_orm::DbErr>,
    ) -> Result<AssignOutcome, InternalError> {
        match result {
            Ok(0) => {
                tracing::debug!(operation, key, "Association already present");
                Ok(AssignOutcome::AlreadyPresent)
            }
            Ok(_) => Ok(AssignOutcome::Inserted),
            Err(e) => Err(InternalError::from_write(operation, entity, "id", key, e)),
        }
    }
}
