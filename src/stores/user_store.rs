use chrono::Utc;
use sea_orm::sea_query::LikeExpr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::errors::InternalError;
use crate::types::db::user;
use crate::types::internal::identity::{NewUser, User, UserUpdate};
use crate::types::internal::validate::require_id;
use crate::types::PageRequest;

/// Row access for the `users` table
///
/// Stateless: every operation runs on the connection it is handed, so the
/// same calls work on the pool and inside a `DatabaseTransaction`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserStore;

impl UserStore {
    pub fn new() -> Self {
        Self
    }

    /// Insert a validated user
    ///
    /// # Returns
    /// * `Ok(User)` - The stored row with its assigned id
    /// * `Err(InternalError::Duplicate)` - Username or email already taken
    pub async fn insert(&self, conn: &impl ConnectionTrait, new_user: &NewUser) -> Result<User, InternalError> {
        self.ensure_unique(conn, None, new_user).await?;

        let now = Utc::now().timestamp();
        let active = user::ActiveModel {
            username: Set(new_user.username().to_string()),
            email: Set(new_user.email().to_string()),
            password_hash: Set(new_user.password_hash().as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(conn)
            .await
            .map_err(|e| InternalError::from_write("insert_user", "user", "username", new_user.username(), e))?;

        tracing::debug!(user_id = model.id, username = %model.username, "User inserted");
        Ok(model.into())
    }

    pub async fn find_by_id(&self, conn: &impl ConnectionTrait, id: u64) -> Result<Option<User>, InternalError> {
        let id = require_id("user_id", id)?;
        let model = user::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))?;
        Ok(model.map(User::from))
    }

    /// Whether a row with this already-checked storage id exists
    pub async fn exists(&self, conn: &impl ConnectionTrait, id: i64) -> Result<bool, InternalError> {
        let matches = user::Entity::find_by_id(id)
            .count(conn)
            .await
            .map_err(|e| InternalError::database("user_exists", e))?;
        Ok(matches > 0)
    }

    pub async fn find_by_username(
        &self,
        conn: &impl ConnectionTrait,
        username: &str,
    ) -> Result<Option<User>, InternalError> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_username", e))?;
        Ok(model.map(User::from))
    }

    pub async fn find_by_email(&self, conn: &impl ConnectionTrait, email: &str) -> Result<Option<User>, InternalError> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))?;
        Ok(model.map(User::from))
    }

    /// Replace every mutable column of an existing user
    pub async fn update(&self, conn: &impl ConnectionTrait, update: &UserUpdate) -> Result<User, InternalError> {
        let id = require_id("user_id", update.id())?;
        let existing = user::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("update_user", e))?
            .ok_or_else(|| InternalError::not_found("user", update.id()))?;

        let fields = update.fields();
        self.ensure_unique(conn, Some(update.id()), fields).await?;

        let mut active: user::ActiveModel = existing.into();
        active.username = Set(fields.username().to_string());
        active.email = Set(fields.email().to_string());
        active.password_hash = Set(fields.password_hash().as_str().to_string());
        active.updated_at = Set(Utc::now().timestamp());

        let model = active
            .update(conn)
            .await
            .map_err(|e| InternalError::from_write("update_user", "user", "username", fields.username(), e))?;
        Ok(model.into())
    }

    /// Delete a user row. Association rows must be removed by the caller first.
    ///
    /// # Returns
    /// * `Ok(true)` - A row was deleted
    /// * `Ok(false)` - No user with that id
    pub async fn delete(&self, conn: &impl ConnectionTrait, id: u64) -> Result<bool, InternalError> {
        let id = require_id("user_id", id)?;
        let result = user::Entity::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("delete_user", e))?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list(&self, conn: &impl ConnectionTrait, page: PageRequest) -> Result<Vec<User>, InternalError> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .offset(page.offset())
            .limit(page.page_size())
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_users", e))?;
        Ok(models.into_iter().map(User::from).collect())
    }

    /// Substring match over username and email
    pub async fn search(
        &self,
        conn: &impl ConnectionTrait,
        query: &str,
        page: PageRequest,
    ) -> Result<Vec<User>, InternalError> {
        let query = query.trim();
        let models = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.like(contains_pattern(query)))
                    .add(user::Column::Email.like(contains_pattern(&query.to_lowercase()))),
            )
            .order_by_asc(user::Column::Id)
            .offset(page.offset())
            .limit(page.page_size())
            .all(conn)
            .await
            .map_err(|e| InternalError::database("search_users", e))?;
        Ok(models.into_iter().map(User::from).collect())
    }

    pub async fn count(&self, conn: &impl ConnectionTrait) -> Result<u64, InternalError> {
        user::Entity::find()
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_users", e))
    }

    // Pre-insert lookups so a collision is reported the same way on every engine
    async fn ensure_unique(
        &self,
        conn: &impl ConnectionTrait,
        exclude_id: Option<u64>,
        fields: &NewUser,
    ) -> Result<(), InternalError> {
        let taken = |found: &Option<User>| found.as_ref().is_some_and(|user| Some(user.id) != exclude_id);

        let by_username = self.find_by_username(conn, fields.username()).await?;
        if taken(&by_username) {
            return Err(InternalError::duplicate("user", "username", fields.username()));
        }

        let by_email = self.find_by_email(conn, fields.email()).await?;
        if taken(&by_email) {
            return Err(InternalError::duplicate("user", "email", fields.email()));
        }

        Ok(())
    }
}

/// `%query%` with the query's own LIKE metacharacters escaped
fn contains_pattern(query: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}
