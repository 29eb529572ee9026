use std::fmt;

use crate::errors::internal::ValidationError;
use crate::types::db::user;
use crate::types::internal::validate::{bounded_name, from_db_id};

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 255;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Opaque password digest as produced by the credential hasher
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[password_hash]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: from_db_id(model.id),
            username: model.username,
            email: model.email,
            password_hash: PasswordHash(model.password_hash),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn sanitize_username(raw: &str) -> Result<String, ValidationError> {
    bounded_name("username", raw, USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH)
}

pub fn sanitize_email(raw: &str) -> Result<String, ValidationError> {
    let email = bounded_name("email", raw, 1, EMAIL_MAX_LENGTH)?.to_lowercase();
    if !email.contains('@') {
        return Err(ValidationError::InvalidEmail(email));
    }
    Ok(email)
}

pub fn validate_password(plaintext: &str) -> Result<(), ValidationError> {
    let actual = plaintext.chars().count();
    if actual < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::Length {
            field: "password",
            min: PASSWORD_MIN_LENGTH,
            max: usize::MAX,
            actual,
        });
    }
    Ok(())
}

/// A user that passed validation and sanitization, ready to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    username: String,
    email: String,
    password_hash: PasswordHash,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password_hash: PasswordHash) -> Result<Self, ValidationError> {
        if password_hash.as_str().is_empty() {
            return Err(ValidationError::Empty { field: "password_hash" });
        }

        Ok(Self {
            username: sanitize_username(username)?,
            email: sanitize_email(email)?,
            password_hash,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

/// Full-row replacement of an existing user
#[derive(Debug, Clone)]
pub struct UserUpdate {
    id: u64,
    fields: NewUser,
}

impl UserUpdate {
    pub fn new(
        id: u64,
        username: &str,
        email: &str,
        password_hash: PasswordHash,
    ) -> Result<Self, ValidationError> {
        crate::types::internal::validate::require_id("user_id", id)?;
        Ok(Self {
            id,
            fields: NewUser::new(username, email, password_hash)?,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn fields(&self) -> &NewUser {
        &self.fields
    }
}
