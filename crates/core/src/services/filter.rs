//! Reports page filters.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use ripple_common::{GeoPoint, haversine_km, parse_coords};
use ripple_db::entities::report::{self, ReportStatus};

/// Filter applied to a report list.
///
/// Stages run in order (status, text, dates, distance) and never reorder
/// the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// Inclusive from midnight UTC.
    pub start_date: Option<NaiveDate>,
    /// Inclusive through 23:59:59.999 UTC.
    pub end_date: Option<NaiveDate>,
    /// `"lat,lng"` centre of the radius filter.
    pub near: Option<String>,
    pub radius_km: Option<f64>,
}

impl ReportFilter {
    /// Keep the reports that pass every stage.
    #[must_use]
    pub fn apply(&self, reports: Vec<report::Model>) -> Vec<report::Model> {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let geo = self.geo_bounds();

        reports
            .into_iter()
            .filter(|r| self.status.is_none_or(|s| r.status == s))
            .filter(|r| search.as_deref().is_none_or(|q| matches_text(r, q)))
            .filter(|r| self.in_date_range(r))
            .filter(|r| {
                geo.is_none_or(|(centre, radius)| {
                    r.location_point().is_some_and(|p| {
                        haversine_km(centre.lat, centre.lng, p.lat, p.lng) <= radius
                    })
                })
            })
            .collect()
    }

    /// The parsed centre and radius, when the distance stage is active.
    fn geo_bounds(&self) -> Option<(GeoPoint, f64)> {
        let radius = self.radius_km.filter(|r| r.is_finite() && *r > 0.0)?;
        let centre = parse_coords(self.near.as_deref()?)?;
        Some((centre, radius))
    }

    fn in_date_range(&self, report: &report::Model) -> bool {
        let created = report.created_at.with_timezone(&Utc);

        if let Some(start) = self.start_date {
            let from = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
            if created < from {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            let Some(until) = NaiveTime::from_hms_milli_opt(23, 59, 59, 999) else {
                return true;
            };
            if created > Utc.from_utc_datetime(&end.and_time(until)) {
                return false;
            }
        }
        true
    }
}

fn matches_text(report: &report::Model, query: &str) -> bool {
    [report.title.as_deref(), report.description.as_deref()]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(query))
}
