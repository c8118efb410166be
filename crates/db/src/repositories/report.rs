//! Report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportStatus},
};
use ripple_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Which reports a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    /// Every report (staff consoles).
    All,
    /// Reports submitted by one user.
    OwnedBy(String),
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }

    /// Get a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {id}")))
    }

    /// List reports in scope, newest first.
    pub async fn list(&self, scope: &ReportScope) -> AppResult<Vec<report::Model>> {
        let mut query = Report::find();

        if let ReportScope::OwnedBy(user_id) = scope {
            query = query.filter(report::Column::UserId.eq(user_id.as_str()));
        }

        query
            .order_by_desc(report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }

    /// List every report not in the given status, newest first.
    pub async fn list_excluding_status(
        &self,
        status: ReportStatus,
    ) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(report::Column::Status.ne(status))
            .order_by_desc(report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }

    /// Persist changes and return the stored row.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.update(self.db.as_ref()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::NotFound("Report".to_string()),
            other => AppError::BackendError(other.to_string()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::report_fixture;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_returns_rows_in_backend_order() {
        let newer = report_fixture("r2", ReportStatus::Pending);
        let older = report_fixture("r1", ReportStatus::Resolved);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[newer.clone(), older.clone()]])
                .into_connection(),
        );

        let repo = ReportRepository::new(Arc::clone(&db));
        let rows = repo.list(&ReportScope::All).await.unwrap();

        assert_eq!(rows, vec![newer, older]);

        drop(repo);
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = conn.into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("ORDER BY"));
        assert!(sql.contains("DESC"));
    }

    #[tokio::test]
    async fn test_update_returns_stored_row() {
        let mut stored = report_fixture("r1", ReportStatus::InProgress);
        stored.estimated_time = Some("2 days".to_string());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored.clone()]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let mut active: report::ActiveModel = report_fixture("r1", ReportStatus::Pending).into();
        active.status = Set(ReportStatus::InProgress);
        active.estimated_time = Set(Some("2 days".to_string()));

        let updated = repo.update(active).await.unwrap();
        assert_eq!(updated, stored);
    }
}
