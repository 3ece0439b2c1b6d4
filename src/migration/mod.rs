//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_companies;
mod m20261001_000002_create_users;
mod m20261001_000003_create_offers;
mod m20261001_000004_create_applications;
mod m20261001_000005_create_application_documents;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_companies::Migration),
            Box::new(m20261001_000002_create_users::Migration),
            Box::new(m20261001_000003_create_offers::Migration),
            Box::new(m20261001_000004_create_applications::Migration),
            Box::new(m20261001_000005_create_application_documents::Migration),
        ]
    }
}
