//! Repositories over the ripple tables.

mod notification;
mod report;
mod staff;
mod status_log;

pub use notification::NotificationRepository;
pub use report::{ReportRepository, ReportScope};
pub use staff::StaffRepository;
pub use status_log::StatusLogRepository;
