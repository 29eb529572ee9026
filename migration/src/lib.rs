pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_identity_tables;
mod m20250301_000002_create_rbac_tables;

pub struct RbacMigrator;

#[async_trait::async_trait]
impl MigratorTrait for RbacMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_identity_tables::Migration),
            Box::new(m20250301_000002_create_rbac_tables::Migration),
        ]
    }
}
