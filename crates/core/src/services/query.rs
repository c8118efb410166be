//! Report listings for the staff consoles.

use ripple_common::{AppResult, GeoPoint};
use ripple_db::{
    entities::report::{self, ReportStatus},
    repositories::{ReportRepository, ReportScope},
};

use super::auth::Role;
use super::board::ReportSource;
use super::filter::ReportFilter;
use super::hotspot::{Hotspot, group_hotspots};

/// Which console a listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    /// Every report.
    Admin,
    /// Every report that is not yet resolved.
    Supervisor,
}

impl From<Role> for Dashboard {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Supervisor => Self::Supervisor,
        }
    }
}

/// Read side of the report store.
#[derive(Clone)]
pub struct ReportQueryService {
    report_repo: ReportRepository,
}

impl ReportQueryService {
    #[must_use]
    pub const fn new(report_repo: ReportRepository) -> Self {
        Self { report_repo }
    }

    /// Reports in scope, newest first.
    pub async fn list_reports(&self, scope: &ReportScope) -> AppResult<Vec<report::Model>> {
        self.report_repo.list(scope).await
    }

    /// A console listing with the page filter applied.
    pub async fn dashboard(
        &self,
        dashboard: Dashboard,
        filter: &ReportFilter,
    ) -> AppResult<Vec<report::Model>> {
        let reports = match dashboard {
            Dashboard::Admin => self.report_repo.list(&ReportScope::All).await?,
            Dashboard::Supervisor => {
                self.report_repo
                    .list_excluding_status(ReportStatus::Resolved)
                    .await?
            }
        };
        Ok(filter.apply(reports))
    }

    /// Parsed locations of every report, newest first.
    pub async fn list_coordinates(&self) -> AppResult<Vec<GeoPoint>> {
        Ok(self
            .report_repo
            .list(&ReportScope::All)
            .await?
            .iter()
            .filter_map(report::Model::location_point)
            .collect())
    }

    /// Heat map groups over every located report.
    pub async fn hotspots(&self) -> AppResult<Vec<Hotspot>> {
        Ok(group_hotspots(&self.list_coordinates().await?))
    }
}

/// A console listing usable as the authoritative source of a board.
///
/// Client-side only, like [`super::board::ReportBoard`].
#[derive(Clone)]
pub struct DashboardFeed {
    queries: ReportQueryService,
    dashboard: Dashboard,
    filter: ReportFilter,
}

impl DashboardFeed {
    #[must_use]
    pub const fn new(queries: ReportQueryService, dashboard: Dashboard, filter: ReportFilter) -> Self {
        Self {
            queries,
            dashboard,
            filter,
        }
    }
}

#[async_trait::async_trait]
impl ReportSource for DashboardFeed {
    async fn fetch_reports(&self) -> AppResult<Vec<report::Model>> {
        self.queries.dashboard(self.dashboard, &self.filter).await
    }
}
