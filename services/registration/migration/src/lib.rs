use sea_orm_migration::prelude::*;

mod m20260801_000001_create_registration_tickets;
mod m20260801_000002_create_pending_registrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_registration_tickets::Migration),
            Box::new(m20260801_000002_create_pending_registrations::Migration),
        ]
    }
}
