//! Database entities.

pub mod admin;
pub mod notification;
pub mod report;
pub mod report_status_log;
pub mod supervisor;

pub use admin::Entity as Admin;
pub use notification::Entity as Notification;
pub use report::Entity as Report;
pub use report_status_log::Entity as ReportStatusLog;
pub use supervisor::Entity as Supervisor;
