//! Optimistic report board.
//!
//! A console keeps a local list of reports. A dispatched action is shown
//! immediately, then replaced by the store's answer, or thrown away by
//! reloading the list if the action fails.
//!
//! This is library state for console clients embedding this crate. The HTTP
//! server is stateless per request and never holds a board.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use ripple_common::{AppError, AppResult};
use ripple_db::entities::report;

/// Authoritative report list behind a board.
#[async_trait::async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_reports(&self) -> AppResult<Vec<report::Model>>;
}

/// Client-side list state of a console.
#[derive(Debug, Default)]
pub struct ReportBoard {
    reports: Vec<report::Model>,
    in_flight: HashSet<String>,
    /// Entries as they were before their optimistic change.
    snapshots: HashMap<String, report::Model>,
}

impl ReportBoard {
    #[must_use]
    pub fn new(reports: Vec<report::Model>) -> Self {
        Self {
            reports,
            ..Self::default()
        }
    }

    /// Build a board from its source.
    pub async fn load(source: &dyn ReportSource) -> AppResult<Self> {
        Ok(Self::new(source.fetch_reports().await?))
    }

    #[must_use]
    pub fn reports(&self) -> &[report::Model] {
        &self.reports
    }

    #[must_use]
    pub fn is_in_flight(&self, report_id: &str) -> bool {
        self.in_flight.contains(report_id)
    }

    /// Apply an optimistic change. Refused while an action for the same
    /// report is still in flight.
    pub fn begin(
        &mut self,
        report_id: &str,
        optimistic: impl FnOnce(&mut report::Model),
    ) -> AppResult<()> {
        if self.in_flight.contains(report_id) {
            return Err(AppError::Conflict(format!(
                "An update for report {report_id} is already in progress"
            )));
        }
        let entry = self
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| AppError::NotFound(format!("Report {report_id}")))?;

        self.snapshots.insert(report_id.to_string(), entry.clone());
        optimistic(entry);
        self.in_flight.insert(report_id.to_string());
        Ok(())
    }

    /// Replace the optimistic entry with the authoritative record.
    pub fn commit(&mut self, updated: report::Model) {
        self.in_flight.remove(&updated.id);
        self.snapshots.remove(&updated.id);
        if let Some(entry) = self.reports.iter_mut().find(|r| r.id == updated.id) {
            *entry = updated;
        }
    }

    /// Discard the optimistic entry by reloading the authoritative list.
    ///
    /// If reloading fails the entry is restored to its pre-dispatch state.
    pub async fn rollback(&mut self, report_id: &str, source: &dyn ReportSource) {
        self.in_flight.remove(report_id);
        let snapshot = self.snapshots.remove(report_id);

        match source.fetch_reports().await {
            Ok(reports) => {
                self.reports = reports;
                self.snapshots.retain(|id, _| self.in_flight.contains(id));
            }
            Err(e) => {
                tracing::warn!(report_id = %report_id, error = %e, "Reload failed; restoring entry");
                if let Some(original) = snapshot
                    && let Some(entry) = self.reports.iter_mut().find(|r| r.id == report_id)
                {
                    *entry = original;
                }
            }
        }
    }

    /// Run `action` with an optimistic change applied in the meantime.
    pub async fn dispatch<F, Fut>(
        &mut self,
        source: &dyn ReportSource,
        report_id: &str,
        optimistic: impl FnOnce(&mut report::Model),
        action: F,
    ) -> AppResult<report::Model>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<report::Model>>,
    {
        self.begin(report_id, optimistic)?;

        match action().await {
            Ok(updated) => {
                self.commit(updated.clone());
                Ok(updated)
            }
            Err(e) => {
                self.rollback(report_id, source).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ripple_db::entities::report::ReportStatus;
    use ripple_db::test_utils::report_fixture;
    use std::sync::Mutex;

    struct FakeSource {
        reports: Mutex<Vec<report::Model>>,
        fail: bool,
    }

    impl FakeSource {
        fn new(reports: Vec<report::Model>) -> Self {
            Self {
                reports: Mutex::new(reports),
                fail: false,
            }
        }
    }

    #[async_trait::async_trait]
    impl ReportSource for FakeSource {
        async fn fetch_reports(&self) -> AppResult<Vec<report::Model>> {
            if self.fail {
                return Err(AppError::BackendError("offline".to_string()));
            }
            Ok(self.reports.lock().unwrap().clone())
        }
    }

    fn start(r: &mut report::Model) {
        r.status = ReportStatus::InProgress;
        r.estimated_time = Some("2 days".to_string());
    }

    #[tokio::test]
    async fn test_failed_action_leaves_refetched_state() {
        let original = vec![
            report_fixture("r1", ReportStatus::Pending),
            report_fixture("r2", ReportStatus::Pending),
        ];
        let source = FakeSource::new(original.clone());
        let mut board = ReportBoard::load(&source).await.unwrap();

        // Someone else changed r2 meanwhile; the reload must pick it up.
        let mut fresh = original.clone();
        fresh[1].status = ReportStatus::InProgress;
        *source.reports.lock().unwrap() = fresh.clone();

        let result = board
            .dispatch(&source, "r1", start, || async {
                Err(AppError::BackendError("write failed".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(board.reports(), fresh.as_slice());
        assert!(!board.is_in_flight("r1"));
    }

    #[tokio::test]
    async fn test_success_replaces_with_authoritative_record() {
        let source = FakeSource::new(vec![report_fixture("r1", ReportStatus::Pending)]);
        let mut board = ReportBoard::load(&source).await.unwrap();

        let mut stored = report_fixture("r1", ReportStatus::InProgress);
        stored.estimated_time = Some("48h".to_string());
        let answer = stored.clone();

        board
            .dispatch(&source, "r1", start, || async move { Ok(answer) })
            .await
            .unwrap();

        assert_eq!(board.reports(), &[stored]);
    }

    #[test]
    fn test_second_dispatch_for_same_report_is_refused() {
        let mut board = ReportBoard::new(vec![report_fixture("r1", ReportStatus::Pending)]);

        board.begin("r1", start).unwrap();
        let again = board.begin("r1", start);

        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(board.reports()[0].status, ReportStatus::InProgress);
    }

    #[tokio::test]
    async fn test_rollback_restores_entry_when_reload_fails() {
        let original = report_fixture("r1", ReportStatus::Pending);
        let mut board = ReportBoard::new(vec![original.clone()]);
        let source = FakeSource {
            reports: Mutex::new(vec![]),
            fail: true,
        };

        board.begin("r1", start).unwrap();
        board.rollback("r1", &source).await;

        assert_eq!(board.reports(), &[original]);
    }
}
