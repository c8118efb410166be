//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `ripple_test`)
//!   `TEST_DB_PASSWORD` (default: `ripple_test`)
//!   `TEST_DB_NAME` (default: `ripple_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use ripple_db::entities::report::{self, ReportStatus};
use ripple_db::repositories::{ReportRepository, ReportScope};
use ripple_db::test_utils::{TestDatabase, TestDbConfig, report_fixture};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_migrations_apply() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_status_column_stores_display_strings() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();

    let row = report_fixture("r1", ReportStatus::Pending);
    row.clone()
        .into_active_model()
        .insert(db.connection())
        .await
        .unwrap();

    let repo = ReportRepository::new(Arc::new(db.conn.clone()));
    let mut active: report::ActiveModel = row.into();
    active.status = Set(ReportStatus::InProgress);
    let updated = repo.update(active).await.unwrap();
    assert_eq!(updated.status, ReportStatus::InProgress);

    let listed = repo.list(&ReportScope::All).await.unwrap();
    assert_eq!(listed.len(), 1);

    db.cleanup().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}
