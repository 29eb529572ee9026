// Types layer - All data structures
pub mod db;
pub mod internal;

pub use internal::auth::Claims;
pub use internal::identity::{NewUser, PasswordHash, User, UserUpdate};
pub use internal::page::{DEFAULT_PAGE_SIZE, PageRequest};
pub use internal::rbac::{AssignOutcome, NewPermission, NewRole, Permission, Role};
