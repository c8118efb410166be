//! Test utilities for database operations.
//!
//! Row fixtures for mock-database tests across the workspace, plus helpers
//! for connecting to a real `PostgreSQL` test database.

use chrono::{Duration, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use tracing::info;

use crate::entities::{
    admin,
    report::{self, ReportStatus},
    supervisor,
};

/// A report row with every optional field empty.
///
/// `created_at` is derived from the trailing digits of `id` so fixtures
/// built in sequence have distinct, increasing timestamps.
#[must_use]
pub fn report_fixture(id: &str, status: ReportStatus) -> report::Model {
    let seq: i64 = id
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0);
    let base = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    report::Model {
        id: id.to_string(),
        user_id: "citizen-1".to_string(),
        title: Some(format!("Report {id}")),
        description: None,
        contact: None,
        location: None,
        coords: None,
        image_url: None,
        status,
        worker_name: None,
        estimated_time: None,
        supervisor_id: None,
        requires_manual_review: false,
        resolved_photo: None,
        resolved_image_url: None,
        resolved_class: None,
        resolved_at: None,
        likes_count: 0,
        comments_count: 0,
        created_at: (base + Duration::hours(seq)).into(),
        updated_at: None,
    }
}

/// An admin role row.
#[must_use]
pub fn admin_fixture(id: &str) -> admin::Model {
    admin::Model {
        id: id.to_string(),
        email: Some(format!("{id}@city.example")),
        created_at: Utc::now().into(),
    }
}

/// A supervisor role row.
#[must_use]
pub fn supervisor_fixture(id: &str, block_id: Option<&str>) -> supervisor::Model {
    supervisor::Model {
        id: id.to_string(),
        email: Some(format!("{id}@city.example")),
        block_id: block_id.map(ToString::to_string),
        created_at: Utc::now().into(),
    }
}

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "ripple_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "ripple_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "ripple_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A connected, migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the default configuration and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        use sea_orm_migration::MigratorTrait;

        let conn = Database::connect(&config.database_url()).await?;
        crate::migrations::Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self { conn, config })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Truncate every ripple table.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in [
            "report_status_logs",
            "notifications",
            "reports",
            "admins",
            "supervisors",
        ] {
            self.conn
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table}\" CASCADE"),
                ))
                .await?;
        }

        info!("Cleaned up test database");
        Ok(())
    }
}
