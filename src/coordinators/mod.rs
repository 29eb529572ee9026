// Coordinators layer - Workflow orchestration
//
// Coordinators compose store and provider operations into the public
// operations of the service. Every multi-step mutation runs inside one
// TransactionCoordinator.

pub mod association_coordinator;
pub mod identity_coordinator;
pub mod permission_coordinator;
pub mod role_coordinator;
pub mod transaction;

pub use association_coordinator::AssociationCoordinator;
pub use identity_coordinator::{IdentityCoordinator, LoginOutcome};
pub use permission_coordinator::PermissionCoordinator;
pub use role_coordinator::RoleCoordinator;
pub use transaction::{TransactionCoordinator, TransactionState};
