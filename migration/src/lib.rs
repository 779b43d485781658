pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_accounts;
mod m20250901_000002_create_catalog;
mod m20250901_000003_create_orders;
mod m20250901_000004_create_points;
mod m20250901_000005_create_chat;
mod m20250915_000006_add_user_verification;
mod m20250915_000007_add_attendance_key;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_accounts::Migration),
            Box::new(m20250901_000002_create_catalog::Migration),
            Box::new(m20250901_000003_create_orders::Migration),
            Box::new(m20250901_000004_create_points::Migration),
            Box::new(m20250901_000005_create_chat::Migration),
            Box::new(m20250915_000006_add_user_verification::Migration),
            Box::new(m20250915_000007_add_attendance_key::Migration),
        ]
    }
}
