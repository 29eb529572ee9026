use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::errors::InternalError;
use crate::types::db::permission;
use crate::types::internal::validate::require_id;
use crate::types::{NewPermission, PageRequest, Permission};

#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionStore;

impl PermissionStore {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert(&self, conn: &impl ConnectionTrait, new_permission: &NewPermission) -> Result<Permission, InternalError> {
        if self.find_by_name(conn, new_permission.name()).await?.is_some() {
            return Err(InternalError::duplicate("permission", "name", new_permission.name()));
        }

        let now = Utc::now().timestamp();
        let model = permission::ActiveModel {
            name: Set(new_permission.name().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| InternalError::from_write("insert_permission", "permission", "name", new_permission.name(), e))?;

        tracing::debug!(permission_id = model.id, name = %model.name, "Permission inserted");
        Ok(model.into())
    }

    pub async fn find_by_id(&self, conn: &impl ConnectionTrait, id: u64) -> Result<Option<Permission>, InternalError> {
        let id = require_id("permission_id", id)?;
        let model = permission::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_permission_by_id", e))?;
        Ok(model.map(Permission::from))
    }

    /// Whether a row with this already-checked storage id exists
    pub async fn exists(&self, conn: &impl ConnectionTrait, id: i64) -> Result<bool, InternalError> {
        let matches = permission::Entity::find_by_id(id)
            .count(conn)
            .await
            .map_err(|e| InternalError::database("permission_exists", e))?;
        Ok(matches > 0)
    }

    pub async fn find_by_name(&self, conn: &impl ConnectionTrait, name: &str) -> Result<Option<Permission>, InternalError> {
        let model = permission::Entity::find()
            .filter(permission::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_permission_by_name", e))?;
        Ok(model.map(Permission::from))
    }

    /// Rename a permission
    pub async fn update(&self, conn: &impl ConnectionTrait, id: u64, fields: &NewPermission) -> Result<Permission, InternalError> {
        let db_id = require_id("permission_id", id)?;
        let existing = permission::Entity::find_by_id(db_id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("update_permission", e))?
            .ok_or_else(|| InternalError::not_found("permission", id))?;

        if let Some(other) = self.find_by_name(conn, fields.name()).await? {
            if other.id != id {
                return Err(InternalError::duplicate("permission", "name", fields.name()));
            }
        }

        let mut active: permission::ActiveModel = existing.into();
        active.name = Set(fields.name().to_string());
        active.updated_at = Set(Utc::now().timestamp());

        let model = active
            .update(conn)
            .await
            .map_err(|e| InternalError::from_write("update_permission", "permission", "name", fields.name(), e))?;
        Ok(model.into())
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, id: u64) -> Result<bool, InternalError> {
        let id = require_id("permission_id", id)?;
        let result = permission::Entity::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_permission", e))?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list(&self, conn: &impl ConnectionTrait, page: PageRequest) -> Result<Vec<Permission>, InternalError> {
        let models = permission::Entity::find()
            .order_by_asc(permission::Column::Id)
            .offset(page.offset())
            .limit(page.page_size())
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_permissions", e))?;
        Ok(models.into_iter().map(Permission::from).collect())
    }

    pub async fn count(&self, conn: &impl ConnectionTrait) -> Result<u64, InternalError> {
        permission::Entity::find()
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_permissions", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_database;

    #[tokio::test]
    async fn test_permission_names_are_stored_lowercase() {
        let db = setup_test_database().await;
        let store = PermissionStore::new();

        let read = store.insert(&db, &NewPermission::new("Users:Read").unwrap()).await.unwrap();
        assert_eq!(read.name, "users:read");

        let err = store.insert(&db, &NewPermission::new("USERS:READ").unwrap()).await.unwrap_err();
        assert!(matches!(err, InternalError::Duplicate { entity: "permission", field: "name", .. }));
    }

    #[tokio::test]
    async fn test_list_and_count_permissions() {
        let db = setup_test_database().await;
        let store = PermissionStore::new();
        for name in ["a", "b", "c"] {
            store.insert(&db, &NewPermission::new(name).unwrap()).await.unwrap();
        }

        assert_eq!(store.count(&db).await.unwrap(), 3);
        let second_page = store.list(&db, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].name, "c");
    }

    #[tokio::test]
    async fn test_delete_missing_permission_returns_false() {
        let db = setup_test_database().await;
        assert!(!PermissionStore::new().delete(&db, 3).await.unwrap());
    }
}
