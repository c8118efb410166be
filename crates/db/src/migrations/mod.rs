//! Database migrations.

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_reports_table;
mod m20250101_000002_create_report_status_logs_table;
mod m20250101_000003_create_notifications_table;
mod m20250101_000004_create_admins_table;
mod m20250101_000005_create_supervisors_table;

/// Migrator for all ripple tables.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_reports_table::Migration),
            Box::new(m20250101_000002_create_report_status_logs_table::Migration),
            Box::new(m20250101_000003_create_notifications_table::Migration),
            Box::new(m20250101_000004_create_admins_table::Migration),
            Box::new(m20250101_000005_create_supervisors_table::Migration),
        ]
    }
}
