use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::app_data::AppData;
use crate::coordinators::TransactionCoordinator;
use crate::errors::{InternalError, ServiceError};
use crate::providers::{CredentialHasher, TokenCodec};
use crate::stores::{AssociationStore, UserStore};
use crate::types::internal::identity::{sanitize_email, sanitize_username, validate_password};
use crate::types::internal::validate::require_id;
use crate::types::{Claims, NewUser, PageRequest, PasswordHash, User, UserUpdate};

/// A successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

/***
 * This coordinator handles the user lifecycle and session authentication
 */
pub struct IdentityCoordinator {
    db: DatabaseConnection,
    user_store: Arc<UserStore>,
    association_store: Arc<AssociationStore>,
    credential_hasher: Arc<CredentialHasher>,
    token_codec: Arc<TokenCodec>,
}

impl IdentityCoordinator {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            db: app_data.db.clone(),
            user_store: Arc::clone(&app_data.user_store),
            association_store: Arc::clone(&app_data.association_store),
            credential_hasher: Arc::clone(&app_data.credential_hasher),
            token_codec: Arc::clone(&app_data.token_codec),
        }
    }

    /// Create a user from a plaintext password
    ///
    /// # Arguments
    /// * `username` - Trimmed, 3 to 255 characters
    /// * `email` - Lower-cased, must contain `@`
    /// * `password` - At least 6 characters, hashed before storage
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user
    /// * `Err(ServiceError)` - BadRequest for invalid input, DuplicateKey when
    ///   the username or email is taken
    pub async fn register_user(&self, username: &str, email: &str, password: &str) -> Result<User, ServiceError> {
        validate_password(password)?;
        // Reject bad input before hashing
        sanitize_username(username)?;
        sanitize_email(email)?;

        let password_hash = self
            .credential_hasher
            .hash(password)
            .map_err(|e| ServiceError::from_internal("register_user", e.into()))?;
        let new_user = NewUser::new(username, email, password_hash)?;

        self.insert_user("register_user", &new_user).await
    }

    /// Create a user from an already-hashed digest
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, ServiceError> {
        self.insert_user("create_user", new_user).await
    }

    pub async fn get_user(&self, id: u64) -> Result<User, ServiceError> {
        require_id("user_id", id)?;
        self.user_store
            .find_by_id(&self.db, id)
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("user", id)))
            .map_err(|e| ServiceError::from_internal("get_user", e))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, ServiceError> {
        let username = sanitize_username(username)?;
        self.user_store
            .find_by_username(&self.db, &username)
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("user", &username)))
            .map_err(|e| ServiceError::from_internal("get_user_by_username", e))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ServiceError> {
        let email = sanitize_email(email)?;
        self.user_store
            .find_by_email(&self.db, &email)
            .await
            .and_then(|found| found.ok_or_else(|| InternalError::not_found("user", &email)))
            .map_err(|e| ServiceError::from_internal("get_user_by_email", e))
    }

    /// Replace username and email, and the password when one is given
    ///
    /// The stored digest is kept when `new_password` is `None`.
    pub async fn update_user(
        &self,
        id: u64,
        username: &str,
        email: &str,
        new_password: Option<&str>,
    ) -> Result<User, ServiceError> {
        let operation = "update_user";
        require_id("user_id", id)?;
        sanitize_username(username)?;
        sanitize_email(email)?;
        let new_hash = match new_password {
            Some(password) => {
                validate_password(password)?;
                let hash = self
                    .credential_hasher
                    .hash(password)
                    .map_err(|e| ServiceError::from_internal(operation, e.into()))?;
                Some(hash)
            }
            None => None,
        };

        let mut tx = TransactionCoordinator::start(self.db.clone(), operation).await?;
        let conn = tx.connection()?;
        let result: Result<User, InternalError> = async {
            // Step 1: Load the current row so its digest can be carried over
            let existing = self
                .user_store
                .find_by_id(conn, id)
                .await?
                .ok_or_else(|| InternalError::not_found("user", id))?;

            // Step 2: Full-row replace
            let password_hash: PasswordHash = new_hash.unwrap_or(existing.password_hash);
            let update = UserUpdate::new(id, username, email, password_hash)?;
            self.user_store.update(conn, &update).await
        }
        .await;
        let user = tx.finish(result).await?;

        tracing::info!(user_id = user.id, password_changed = new_password.is_some(), "User updated");
        Ok(user)
    }

    /// Delete a user together with every role link it holds
    pub async fn delete_user(&self, id: u64) -> Result<(), ServiceError> {
        let db_id = require_id("user_id", id)?;

        let mut tx = TransactionCoordinator::start(self.db.clone(), "delete_user").await?;
        let conn = tx.connection()?;
        let result: Result<u64, InternalError> = async {
            if self.user_store.find_by_id(conn, id).await?.is_none() {
                return Err(InternalError::not_found("user", id));
            }
            let links = self.association_store.delete_user_links(conn, db_id).await?;
            self.user_store.delete(conn, id).await?;
            Ok(links)
        }
        .await;
        let links = tx.finish(result).await?;

        tracing::info!(user_id = id, removed_links = links, "User deleted");
        Ok(())
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<Vec<User>, ServiceError> {
        self.user_store
            .list(&self.db, page)
            .await
            .map_err(|e| ServiceError::from_internal("list_users", e))
    }

    /// Substring search over username and email
    pub async fn search_users(&self, query: &str, page: PageRequest) -> Result<Vec<User>, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::BadRequest("search query must not be empty".to_string()));
        }
        self.user_store
            .search(&self.db, query, page)
            .await
            .map_err(|e| ServiceError::from_internal("search_users", e))
    }

    pub async fn count_users(&self) -> Result<u64, ServiceError> {
        self.user_store
            .count(&self.db)
            .await
            .map_err(|e| ServiceError::from_internal("count_users", e))
    }

    /// Verify a password and issue a session token
    ///
    /// An unknown username and a wrong password produce the same
    /// `InvalidCredentials` error. The first successful login creates the
    /// token key file if none exists yet.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ServiceError> {
        let Ok(username) = sanitize_username(username) else {
            return Err(ServiceError::InvalidCredentials);
        };

        let user = self
            .user_store
            .find_by_username(&self.db, &username)
            .await
            .map_err(|e| ServiceError::from_internal("login", e))?;

        let Some(user) = user else {
            tracing::warn!(username = %username, "Login failed: unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.credential_hasher.verify(&user.password_hash, password) {
            tracing::warn!(user_id = user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let claims = Claims::for_user(&user, Utc::now().timestamp());
        let token = self
            .token_codec
            .issue(claims)
            .await
            .map_err(|e| ServiceError::from_internal("login", e.into()))?;

        tracing::info!(user_id = user.id, "Login succeeded");
        Ok(LoginOutcome { user, token })
    }

    /// Verify the token carried in an `Authorization` header value
    ///
    /// Accepts the bare token or `Bearer <token>`, scheme matched ignoring case.
    pub async fn authenticate(&self, authorization: &str) -> Result<Claims, ServiceError> {
        let token = bearer_token(authorization);
        if token.is_empty() {
            return Err(ServiceError::Unauthorized("missing token".to_string()));
        }

        self.token_codec
            .verify(token)
            .await
            .map_err(|e| ServiceError::from_internal("authenticate", e.into()))
    }

    async fn insert_user(&self, operation: &'static str, new_user: &NewUser) -> Result<User, ServiceError> {
        let mut tx = TransactionCoordinator::start(self.db.clone(), operation).await?;
        let result = self.user_store.insert(tx.connection()?, new_user).await;
        let user = tx.finish(result).await?;

        tracing::info!(user_id = user.id, username = %user.username, "User created");
        Ok(user)
    }
}

/// Token part of an `Authorization` value; empty when only the scheme is present
fn bearer_token(authorization: &str) -> &str {
    let header = authorization.trim();
    match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if header.eq_ignore_ascii_case("bearer") => "",
        _ => header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_scheme_is_stripped() {
        assert_eq!(bearer_token("Bearer v2.local.abc"), "v2.local.abc");
        assert_eq!(bearer_token("  bearer   v2.local.abc "), "v2.local.abc");
        assert_eq!(bearer_token("BEARER\tv2.local.abc"), "v2.local.abc");
        assert_eq!(bearer_token("v2.local.abc"), "v2.local.abc");
    }

    #[test]
    fn test_scheme_without_token_is_empty() {
        assert_eq!(bearer_token("Bearer "), "");
        assert_eq!(bearer_token("bearer"), "");
        assert_eq!(bearer_token("   "), "");
    }
}
