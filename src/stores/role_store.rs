use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::errors::InternalError;
use crate::types::db::role;
use crate::types::internal::validate::require_id;
use crate::types::{NewRole, PageRequest, Role};

#[derive(Debug, Default, Clone, Copy)]
pub struct RoleStore;

impl RoleStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert(&self, conn: &impl ConnectionTrait, new_role: &NewRole) -> Result<Role, InternalError> {
        if self.find_by_name(conn, new_role.name()).await?.is_some() {
            return Err(InternalError::duplicate("role", "name", new_role.name()));
        }

        let now = Utc::now().timestamp();
        let model = role::ActiveModel {
            name: Set(new_role.name().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::from_write("insert_role", "role", "name", new_role.name(), e))?;

        tracing::debug!(role_id = model.id, name = %model.name, "Role inserted");
        Ok(model.into())
    }

    pub async fn find_by_id(&self, conn: &impl ConnectionTrait, id: u64) -> Result<Option<Role>, InternalError> {
        let id = require_id("role_id", id)?;
        let model = role::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_role_by_id", e))?;
        Ok(model.map(Role::from))
    }

    /// Whether a row with this already-checked storage id exists
    pub async fn exists(&self, conn: &impl ConnectionTrait, id: i64) -> Result<bool, InternalError> {
        let matches = role::Entity::find_by_id(id)
            .count(conn)
            .await
            .map_err(|e| InternalError::database("role_exists", e))?;
        Ok(matches > 0)
    }

    pub async fn find_by_name(&self, conn: &impl ConnectionTrait, name: &str) -> Result<Option<Role>, InternalError> {
        let model = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_role_by_name", e))?;
        Ok(model.map(Role::from))
    }

    /// Rename a role; the new name must not belong to another role
    pub async fn update(&self, conn: &impl ConnectionTrait, id: u64, fields: &NewRole) -> Result<Role, InternalError> {
        let db_id = require_id("role_id", id)?;
        let existing = role::Entity::find_by_id(db_id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("update_role", e))?
            .ok_or_else(|| InternalError::not_found("role", id))?;

        if let Some(other) = self.find_by_name(conn, fields.name()).await? {
            if other.id != id {
                return Err(InternalError::duplicate("role", "name", fields.name()));
            }
        }

        let mut active: role::ActiveModel = existing.into();
        active.name = Set(fields.name().to_string());
        active.updated_at = Set(Utc::now().timestamp());

        let model = active
            .update(conn)
            .await
            .map_err(|e| InternalError::from_write("update_role", "role", "name", fields.name(), e))?;
        Ok(model.into())
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, id: u64) -> Result<bool, InternalError> {
        let id = require_id("role_id", id)?;
        let result = role::Entity::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_role", e))?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list(&self, conn: &impl ConnectionTrait, page: PageRequest) -> Result<Vec<Role>, InternalError> {
        let models = role::Entity::find()
            .order_by_asc(role::Column::Id)
            .offset(page.offset())
            .limit(page.page_size())
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_roles", e))?;
        Ok(models.into_iter().map(Role::from).collect())
    }

    pub async fn count(&self, conn: &impl ConnectionTrait) -> Result<u64, InternalError> {
        role::Entity::find()
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_roles", e))
    }
}
