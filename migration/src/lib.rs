pub use sea_orm_migration::prelude::*;

mod m20260105_000001_create_users_and_points_records;
mod m20260105_000002_create_activity_tables;
mod m20260112_000001_create_release_tables;
mod m20260120_000001_add_settlement_week_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_users_and_points_records::Migration),
            Box::new(m20260105_000002_create_activity_tables::Migration),
            Box::new(m20260112_000001_create_release_tables::Migration),
            Box::new(m20260120_000001_add_settlement_week_guard::Migration),
        ]
    }
}
