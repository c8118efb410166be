//! API endpoints.

mod admin;
mod auth;
mod reports;
mod supervisor;

use axum::Router;
use chrono::NaiveDate;
use ripple_common::AppError;
use ripple_core::ReportFilter;
use serde::Deserialize;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(reports::router())
        .nest("/admin", admin::router())
        .nest("/supervisor", supervisor::router())
}

/// Query string of the report listings.
///
/// Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Restrict the admin listing to one citizen's reports.
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub q: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub near: Option<String>,
    pub radius_km: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    present(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("{field} must be YYYY-MM-DD, got {v}")))
        })
        .transpose()
}

impl TryFrom<ReportQuery> for ReportFilter {
    type Error = AppError;

    fn try_from(query: ReportQuery) -> Result<Self, Self::Error> {
        let status = present(query.status)
            .map(|s| s.parse().map_err(AppError::BadRequest))
            .transpose()?;
        let radius_km = present(query.radius_km)
            .map(|r| {
                r.parse::<f64>()
                    .map_err(|_| AppError::BadRequest(format!("radius_km must be a number, got {r}")))
            })
            .transpose()?;

        Ok(Self {
            status,
            search: present(query.q),
            start_date: parse_date("start_date", query.start_date)?,
            end_date: parse_date("end_date", query.end_date)?,
            near: present(query.near),
            radius_km,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ripple_db::entities::report::ReportStatus;

    #[test]
    fn test_query_to_filter() {
        let query = ReportQuery {
            status: Some("In Progress".to_string()),
            q: Some("  ".to_string()),
            start_date: Some("2025-03-01".to_string()),
            radius_km: Some("2.5".to_string()),
            ..ReportQuery::default()
        };

        let filter = ReportFilter::try_from(query).unwrap();

        assert_eq!(filter.status, Some(ReportStatus::InProgress));
        assert_eq!(filter.search, None);
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(filter.radius_km, Some(2.5));
    }

    #[test]
    fn test_bad_values_are_bad_requests() {
        let bad_status = ReportQuery {
            status: Some("Closed".to_string()),
            ..ReportQuery::default()
        };
        let bad_date = ReportQuery {
            end_date: Some("10/03/2025".to_string()),
            ..ReportQuery::default()
        };

        assert!(matches!(ReportFilter::try_from(bad_status), Err(AppError::BadRequest(_))));
        assert!(matches!(ReportFilter::try_from(bad_date), Err(AppError::BadRequest(_))));
    }
}
