use crate::errors::internal::ValidationError;
use crate::types::db::{permission, role};
use crate::types::internal::validate::{bounded_name, from_db_id};

pub const ROLE_NAME_MIN_LENGTH: usize = 3;
pub const PERMISSION_NAME_MIN_LENGTH: usize = 1;
pub const NAME_MAX_LENGTH: usize = 255;

/// Minimum length of a role name passed to a membership query
pub const ROLE_QUERY_MIN_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: u64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<role::Model> for Role {
    fn from(model: role::Model) -> Self {
        Self {
            id: from_db_id(model.id),
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub id: u64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<permission::Model> for Permission {
    fn from(model: permission::Model) -> Self {
        Self {
            id: from_db_id(model.id),
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Validated role name for create and rename
#[derive(Debug, Clone)]
pub struct NewRole {
    name: String,
}

impl NewRole {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: bounded_name("name", name, ROLE_NAME_MIN_LENGTH, NAME_MAX_LENGTH)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validated permission name, stored lower-cased
#[derive(Debug, Clone)]
pub struct NewPermission {
    name: String,
}

impl NewPermission {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = bounded_name("name", name, PERMISSION_NAME_MIN_LENGTH, NAME_MAX_LENGTH)?;
        Ok(Self {
            name: name.to_lowercase(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Role name as used by membership checks
pub fn sanitize_role_query(name: &str) -> Result<String, ValidationError> {
    bounded_name("role_name", name, ROLE_QUERY_MIN_LENGTH, NAME_MAX_LENGTH)
}

/// Permission name as used by authorization checks
pub fn sanitize_permission_query(name: &str) -> Result<String, ValidationError> {
    Ok(NewPermission::new(name)?.name)
}

/// Result of inserting one association row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Inserted,
    AlreadyPresent,
}
