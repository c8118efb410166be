//! Report entity.

use std::fmt;
use std::str::FromStr;

use ripple_common::{GeoPoint, parse_coords};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a report.
///
/// Stored as the exact strings shown to staff (`"In Progress"` keeps its space).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ReportStatus {
    #[sea_orm(string_value = "Pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

impl ReportStatus {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "In Progress" => Ok(Self::InProgress),
            "Resolved" => Ok(Self::Resolved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// Report model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Submitting citizen; target of the resolution notification.
    pub user_id: String,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub contact: Option<String>,
    /// Free-text location as entered by the submitter.
    pub location: Option<String>,
    /// Raw coordinates: `"lat,lng"` or a `{"lat":..,"lng":..}` object.
    pub coords: Option<String>,
    /// Submitter photo.
    pub image_url: Option<String>,
    pub status: ReportStatus,
    /// Set by a supervisor on assignment.
    pub worker_name: Option<String>,
    /// Set by an admin when work starts.
    pub estimated_time: Option<String>,
    /// Supervisor who assigned the worker.
    pub supervisor_id: Option<String>,
    /// Automated classification could not confirm the resolution.
    pub requires_manual_review: bool,
    pub resolved_photo: Option<String>,
    pub resolved_image_url: Option<String>,
    pub resolved_class: Option<String>,
    pub resolved_at: Option<DateTimeWithTimeZone>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// The canonical parsed location of this report, if any.
    #[must_use]
    pub fn location_point(&self) -> Option<GeoPoint> {
        self.coords.as_deref().and_then(parse_coords)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report_status_log::Entity")]
    StatusLogs,
}

impl Related<super::report_status_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_roundtrip_through_from_str() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::InProgress,
            ReportStatus::Resolved,
            ReportStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ReportStatus>(), Ok(status));
        }
        assert!("in progress".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_with_space() {
        let json = serde_json::to_string(&ReportStatus::InProgress).ok();
        assert_eq!(json.as_deref(), Some("\"In Progress\""));
    }
}
