//! Report lifecycle engine.
//!
//! | From        | To          | Actor              |
//! |-------------|-------------|--------------------|
//! | Pending     | In Progress | admin              |
//! | In Progress | (worker)    | supervisor         |
//! | In Progress | Resolved    | admin, supervisor  |
//! | In Progress | Pending     | classifier verdict |
//!
//! Requests are checked in a fixed order: input validation, actor role,
//! report lookup, stored state. Nothing touches the database until the
//! input is known to be well-formed.

use std::sync::Arc;

use chrono::Utc;
use ripple_common::{AppError, AppResult, IdGenerator};
use ripple_db::{
    entities::{
        report::{self, ReportStatus},
        report_status_log,
    },
    repositories::{ReportRepository, StatusLogRepository},
};
use sea_orm::Set;

use super::auth::{Role, Session};
use super::classifier::{Classification, Classifier};
use super::notification::NotificationEmitter;

/// A requested change to a report.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Pending -> In Progress with an estimate.
    StartWork { estimated_time: String },
    /// Record the worker on an in-progress report.
    AssignWorker { worker_name: String },
    /// In Progress -> Resolved with an evidence photo.
    Resolve {
        photo_url: String,
        resolved_class: Option<String>,
    },
    /// In Progress -> Pending, flagged for manual review.
    RequireManualReview,
    /// Requests for a status no path leads to.
    Unsupported(ReportStatus),
}

impl Transition {
    /// Map a generic status update onto a transition.
    #[must_use]
    pub fn from_status_update(update: &StatusUpdate) -> Self {
        match update.status {
            ReportStatus::Resolved => Self::Resolve {
                photo_url: update.photo_url.clone().unwrap_or_default(),
                resolved_class: None,
            },
            ReportStatus::InProgress => Self::StartWork {
                estimated_time: update.estimated_time.clone().unwrap_or_default(),
            },
            other => Self::Unsupported(other),
        }
    }

    /// Reject missing side-effect inputs.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::StartWork { estimated_time } if estimated_time.trim().is_empty() => Err(
                AppError::ValidationFailed("estimated_time is required".to_string()),
            ),
            Self::AssignWorker { worker_name } if worker_name.trim().is_empty() => Err(
                AppError::ValidationFailed("worker_name is required".to_string()),
            ),
            Self::Resolve { photo_url, .. } if photo_url.trim().is_empty() => Err(
                AppError::ValidationFailed("An evidence photo is required to resolve".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Check the actor may request this transition at all.
    pub fn authorize(&self, role: Role) -> AppResult<()> {
        let allowed = match self {
            Self::StartWork { .. } => role == Role::Admin,
            Self::AssignWorker { .. } | Self::RequireManualReview => role == Role::Supervisor,
            Self::Resolve { .. } | Self::Unsupported(_) => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{role:?} may not {}",
                self.describe()
            )))
        }
    }

    /// Check the stored report allows this transition.
    pub fn check(&self, report: &report::Model, role: Role) -> AppResult<()> {
        match self {
            Self::StartWork { .. } => expect_status(report, ReportStatus::Pending),
            Self::AssignWorker { .. } => {
                expect_status(report, ReportStatus::InProgress)?;
                if let Some(worker) = &report.worker_name {
                    return Err(AppError::Conflict(format!(
                        "Report {} is already assigned to {worker}",
                        report.id
                    )));
                }
                Ok(())
            }
            Self::Resolve { .. } => {
                expect_status(report, ReportStatus::InProgress)?;
                if role == Role::Supervisor && report.worker_name.is_none() {
                    return Err(AppError::Conflict(format!(
                        "Report {} has no worker assigned",
                        report.id
                    )));
                }
                Ok(())
            }
            Self::RequireManualReview => expect_status(report, ReportStatus::InProgress),
            Self::Unsupported(status) => Err(AppError::Conflict(format!(
                "Report {} cannot be moved to {status}",
                report.id
            ))),
        }
    }

    /// Build the changes to persist.
    #[must_use]
    pub fn apply(&self, report: report::Model, actor: &Session) -> report::ActiveModel {
        let now = Utc::now();
        let mut active: report::ActiveModel = report.into();

        match self {
            Self::StartWork { estimated_time } => {
                active.status = Set(ReportStatus::InProgress);
                active.estimated_time = Set(Some(estimated_time.trim().to_string()));
            }
            Self::AssignWorker { worker_name } => {
                active.worker_name = Set(Some(worker_name.trim().to_string()));
                active.supervisor_id = Set(Some(actor.id.clone()));
            }
            Self::Resolve {
                photo_url,
                resolved_class,
            } => {
                active.status = Set(ReportStatus::Resolved);
                active.resolved_photo = Set(Some(photo_url.clone()));
                active.resolved_image_url = Set(Some(photo_url.clone()));
                active.resolved_class = Set(resolved_class.clone());
                active.resolved_at = Set(Some(now.into()));
                active.requires_manual_review = Set(false);
            }
            Self::RequireManualReview => {
                active.status = Set(ReportStatus::Pending);
                active.requires_manual_review = Set(true);
            }
            Self::Unsupported(_) => {}
        }

        active.updated_at = Set(Some(now.into()));
        active
    }

    /// Status after this transition, if it changes the status.
    #[must_use]
    pub const fn target_status(&self) -> Option<ReportStatus> {
        match self {
            Self::StartWork { .. } => Some(ReportStatus::InProgress),
            Self::Resolve { .. } => Some(ReportStatus::Resolved),
            Self::RequireManualReview => Some(ReportStatus::Pending),
            Self::AssignWorker { .. } | Self::Unsupported(_) => None,
        }
    }

    const fn describe(&self) -> &'static str {
        match self {
            Self::StartWork { .. } => "start work",
            Self::AssignWorker { .. } => "assign workers",
            Self::Resolve { .. } => "resolve reports",
            Self::RequireManualReview => "request manual review",
            Self::Unsupported(_) => "change status",
        }
    }
}

fn expect_status(report: &report::Model, expected: ReportStatus) -> AppResult<()> {
    if report.status == expected {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Report {} is {}, expected {expected}",
            report.id, report.status
        )))
    }
}

/// Generic status change request.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: ReportStatus,
    pub photo_url: Option<String>,
    pub estimated_time: Option<String>,
}

/// Result of a supervisor completing a report.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub status: ReportStatus,
    /// Present only when the classifier decided the outcome.
    pub requires_manual_review: Option<bool>,
    pub classification: Option<Classification>,
    pub report: report::Model,
}

/// Executes lifecycle transitions against the report store.
#[derive(Clone)]
pub struct ReportLifecycleService {
    report_repo: ReportRepository,
    status_log_repo: StatusLogRepository,
    notifier: NotificationEmitter,
    classifier: Option<Arc<dyn Classifier>>,
    min_confidence: f64,
    id_gen: IdGenerator,
}

impl ReportLifecycleService {
    /// Create a lifecycle service. Without a classifier, supervisor
    /// completion resolves directly.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        status_log_repo: StatusLogRepository,
        notifier: NotificationEmitter,
        classifier: Option<Arc<dyn Classifier>>,
        min_confidence: f64,
    ) -> Self {
        Self {
            report_repo,
            status_log_repo,
            notifier,
            classifier,
            min_confidence,
            id_gen: IdGenerator::new(),
        }
    }

    /// Admin starts work on a pending report.
    pub async fn start_work(
        &self,
        actor: &Session,
        report_id: &str,
        estimated_time: &str,
    ) -> AppResult<report::Model> {
        let transition = Transition::StartWork {
            estimated_time: estimated_time.to_string(),
        };
        self.transition(actor, report_id, &transition).await
    }

    /// Supervisor assigns a worker to an in-progress report.
    pub async fn assign_worker(
        &self,
        actor: &Session,
        report_id: &str,
        worker_name: &str,
    ) -> AppResult<report::Model> {
        let transition = Transition::AssignWorker {
            worker_name: worker_name.to_string(),
        };
        self.transition(actor, report_id, &transition).await
    }

    /// Generic status change.
    pub async fn update_status(
        &self,
        actor: &Session,
        report_id: &str,
        update: &StatusUpdate,
    ) -> AppResult<report::Model> {
        let transition = Transition::from_status_update(update);
        self.transition(actor, report_id, &transition).await
    }

    /// Admin resolves a report with a photo and optional label. Never calls
    /// the classifier.
    pub async fn resolve_manual(
        &self,
        actor: &Session,
        report_id: &str,
        image_url: &str,
        resolved_class: Option<String>,
    ) -> AppResult<report::Model> {
        if actor.require_role()? != Role::Admin {
            return Err(AppError::Forbidden(
                "Only admins may resolve reports manually".to_string(),
            ));
        }
        let transition = Transition::Resolve {
            photo_url: image_url.to_string(),
            resolved_class: resolved_class.filter(|c| !c.trim().is_empty()),
        };
        self.transition(actor, report_id, &transition).await
    }

    /// Supervisor marks a report complete with an evidence photo.
    ///
    /// When a classifier is configured its verdict decides between Resolved
    /// and a manual-review rollback to Pending.
    pub async fn complete(
        &self,
        actor: &Session,
        report_id: &str,
        image_url: &str,
    ) -> AppResult<CompletionOutcome> {
        let resolve = Transition::Resolve {
            photo_url: image_url.to_string(),
            resolved_class: None,
        };
        resolve.validate()?;
        let role = actor.require_role()?;
        if role != Role::Supervisor {
            return Err(AppError::Forbidden(
                "Only supervisors may complete reports".to_string(),
            ));
        }
        if let Some(classifier) = &self.classifier {
            classifier.check_source(image_url).await?;
        }

        let report = self.report_repo.get_by_id(report_id).await?;
        resolve.check(&report, role)?;

        let Some(classifier) = &self.classifier else {
            let updated = self.persist(actor, report, &resolve).await?;
            return Ok(CompletionOutcome {
                status: updated.status,
                requires_manual_review: None,
                classification: None,
                report: updated,
            });
        };

        let verdict = classifier.classify(image_url).await?;
        let transition = if verdict.confirms_resolution(self.min_confidence) {
            Transition::Resolve {
                photo_url: image_url.to_string(),
                resolved_class: Some(verdict.predicted_class.clone()),
            }
        } else {
            tracing::info!(
                report_id = %report_id,
                class = %verdict.predicted_class,
                confidence = verdict.confidence,
                "Classifier did not confirm resolution; flagging for manual review"
            );
            Transition::RequireManualReview
        };

        let updated = self.persist(actor, report, &transition).await?;
        Ok(CompletionOutcome {
            status: updated.status,
            requires_manual_review: Some(updated.requires_manual_review),
            classification: Some(verdict),
            report: updated,
        })
    }

    async fn transition(
        &self,
        actor: &Session,
        report_id: &str,
        transition: &Transition,
    ) -> AppResult<report::Model> {
        transition.validate()?;
        let role = actor.require_role()?;
        transition.authorize(role)?;

        let report = self.report_repo.get_by_id(report_id).await?;
        transition.check(&report, role)?;

        self.persist(actor, report, transition).await
    }

    async fn persist(
        &self,
        actor: &Session,
        report: report::Model,
        transition: &Transition,
    ) -> AppResult<report::Model> {
        let previous = report.status;
        let updated = self.report_repo.update(transition.apply(report, actor)).await?;

        tracing::info!(
            report_id = %updated.id,
            actor_id = %actor.id,
            from = %previous,
            to = %updated.status,
            "Report updated"
        );

        if let Some(status) = transition.target_status() {
            self.log_status(&updated.id, status, &actor.id).await;
        }
        if updated.status == ReportStatus::Resolved {
            self.notifier.notify_resolved(&updated);
        }

        Ok(updated)
    }

    async fn log_status(&self, report_id: &str, status: ReportStatus, actor_id: &str) {
        let model = report_status_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            report_id: Set(report_id.to_string()),
            new_status: Set(status),
            admin_id: Set(Some(actor_id.to_string())),
            created_at: Set(Utc::now().into()),
        };
        if let Err(e) = self.status_log_repo.create(model).await {
            tracing::warn!(report_id = %report_id, error = %e, "Skipping status log");
        }
    }
}
