//! Citizen notifications for resolved reports.

use ripple_common::IdGenerator;
use ripple_db::{entities::{notification, report}, repositories::NotificationRepository};
use sea_orm::Set;
use tokio::task::JoinHandle;

/// Message sent to the submitter when their report is resolved.
#[must_use]
pub fn resolved_message(title: Option<&str>) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("Untitled");
    format!("Your report \"{title}\" has been resolved.")
}

/// Fire-and-forget notification emitter.
#[derive(Clone)]
pub struct NotificationEmitter {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationEmitter {
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Queue the resolution notice for `report.user_id`.
    ///
    /// Returns immediately. Failures are logged and dropped.
    pub fn notify_resolved(&self, report: &report::Model) -> JoinHandle<()> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(report.user_id.clone()),
            message: Set(resolved_message(report.title.as_deref())),
            read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };
        let repo = self.notification_repo.clone();
        let report_id = report.id.clone();

        tokio::spawn(async move {
            match repo.create(model).await {
                Ok(_) => tracing::debug!(report_id = %report_id, "Resolution notification stored"),
                Err(e) => tracing::warn!(
                    report_id = %report_id,
                    error = %e,
                    "Skipping resolution notification"
                ),
            }
        })
    }
}
