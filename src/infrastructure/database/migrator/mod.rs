//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_roles;
mod m20240101_000003_create_user_relations;
mod m20240101_000004_create_role_claims;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_roles::Migration),
            Box::new(m20240101_000003_create_user_relations::Migration),
            Box::new(m20240101_000004_create_role_claims::Migration),
        ]
    }
}
