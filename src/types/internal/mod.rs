pub mod auth;
pub mod identity;
pub mod page;
pub mod rbac;
pub mod validate;
