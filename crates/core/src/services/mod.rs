//! Business logic services.

#![allow(missing_docs)]

pub mod auth;
pub mod board;
pub mod classifier;
pub mod evidence;
pub mod filter;
pub mod hotspot;
pub mod lifecycle;
pub mod notification;
pub mod query;

pub use auth::{
    AccessDecision, AdminProbe, AuthResolver, Identity, IdentityVerifier, JwtVerifier, Role,
    RoleProbe, Session, StaffRecord, SupervisorProbe, authorize,
};
pub use board::{ReportBoard, ReportSource};
pub use classifier::{
    Classification, Classifier, HttpClassifier, RESOLVED_CLASSES, describe_class,
    is_resolved_class,
};
pub use evidence::EvidenceService;
pub use filter::ReportFilter;
pub use hotspot::{Hotspot, group_hotspots};
pub use lifecycle::{CompletionOutcome, ReportLifecycleService, StatusUpdate, Transition};
pub use notification::{NotificationEmitter, resolved_message};
pub use query::{Dashboard, DashboardFeed, ReportQueryService};
