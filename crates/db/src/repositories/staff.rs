//! Role record lookups.

use std::sync::Arc;

use crate::entities::{Admin, Supervisor, admin, supervisor};
use ripple_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Lookups against the `admins` and `supervisors` tables.
#[derive(Clone)]
pub struct StaffRepository {
    db: Arc<DatabaseConnection>,
}

impl StaffRepository {
    /// Create a new staff repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Admin record for an identity subject.
    pub async fn find_admin(&self, id: &str) -> AppResult<Option<admin::Model>> {
        Admin::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }

    /// Supervisor record for an identity subject.
    pub async fn find_supervisor(&self, id: &str) -> AppResult<Option<supervisor::Model>> {
        Supervisor::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::BackendError(e.to_string()))
    }
}
