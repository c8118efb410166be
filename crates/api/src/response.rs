//! API response types.

use ripple_common::GeoPoint;
use ripple_core::{CompletionOutcome, Hotspot, describe_class, is_resolved_class};
use ripple_db::entities::report::{self, ReportStatus};
use serde::Serialize;

/// A report as returned to the consoles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResponse {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub coords: Option<String>,
    pub location_point: Option<GeoPoint>,
    pub image_url: Option<String>,
    pub status: ReportStatus,
    pub worker_name: Option<String>,
    pub estimated_time: Option<String>,
    pub supervisor_id: Option<String>,
    pub requires_manual_review: bool,
    pub resolved_photo: Option<String>,
    pub resolved_image_url: Option<String>,
    pub resolved_class: Option<String>,
    pub resolved_at: Option<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<report::Model> for ReportResponse {
    fn from(r: report::Model) -> Self {
        let location_point = r.location_point();
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            contact: r.contact,
            location: r.location,
            coords: r.coords,
            location_point,
            image_url: r.image_url,
            status: r.status,
            worker_name: r.worker_name,
            estimated_time: r.estimated_time,
            supervisor_id: r.supervisor_id,
            requires_manual_review: r.requires_manual_review,
            resolved_photo: r.resolved_photo,
            resolved_image_url: r.resolved_image_url,
            resolved_class: r.resolved_class,
            resolved_at: r.resolved_at.map(|t| t.to_rfc3339()),
            likes_count: r.likes_count,
            comments_count: r.comments_count,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Answer to a supervisor completion.
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_manual_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_class: Option<String>,
    pub report: ReportResponse,
}

impl From<CompletionOutcome> for CompleteResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        Self {
            status: outcome.status,
            requires_manual_review: outcome.requires_manual_review,
            predicted_class: outcome.classification.map(|c| c.predicted_class),
            report: outcome.report.into(),
        }
    }
}

/// A stored evidence photo.
#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    pub url: String,
    pub key: String,
    pub size: u64,
}

/// A classifier label with its display text.
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    pub label: String,
    pub description: String,
    pub resolved: bool,
}

impl ClassResponse {
    #[must_use]
    pub fn for_label(label: &str) -> Self {
        Self {
            label: label.to_string(),
            description: describe_class(label),
            resolved: is_resolved_class(label),
        }
    }
}

/// A heat map group.
#[derive(Debug, Serialize)]
pub struct HotspotResponse {
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    pub intensity: f64,
}

impl From<Hotspot> for HotspotResponse {
    fn from(h: Hotspot) -> Self {
        Self {
            lat: h.lat,
            lng: h.lng,
            count: h.count,
            intensity: h.intensity,
        }
    }
}

/// Empty success.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    #[must_use]
    pub const fn new() -> Self {
        Self { ok: true }
    }
}

impl Default for OkResponse {
    fn default() -> Self {
        Self::new()
    }
}
