// Stores layer - Row access over a caller-supplied connection
pub mod association_store;
pub mod permission_store;
pub mod role_store;
pub mod user_store;

pub use association_store::AssociationStore;
pub use permission_store::PermissionStore;
pub use role_store::RoleStore;
pub use user_store::UserStore;
