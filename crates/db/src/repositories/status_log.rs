//! Report status log repository.

use std::sync::Arc;

use crate::entities::{ReportStatusLog, report_status_log};
use ripple_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Status log repository for database operations.
#[derive(Clone)]
pub struct StatusLogRepository {
    db: Arc<DatabaseConnection>,
}

impl StatusLogRepository {
    /// Create a new status log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a log row.
    pub async fn create(
        &self,
        model: report_status_log::ActiveModel,
    ) -> AppResult<report_status_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }

    /// History of a report, oldest first.
    pub async fn find_by_report(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<report_status_log::Model>> {
        ReportStatusLog::find()
            .filter(report_status_log::Column::ReportId.eq(report_id))
            .order_by_asc(report_status_log::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }
}
