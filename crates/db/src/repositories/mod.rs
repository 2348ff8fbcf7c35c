//! Zero-sized repositories, one per table group. Every method takes the pool
//! explicitly and returns `sqlx::Error` untouched so the API layer can
//! classify it.

pub mod catalog_repo;
pub mod log_repo;
pub mod notification_repo;
pub mod requisition_repo;
pub mod schedule_repo;
pub mod ticket_repo;
pub mod user_repo;

pub use catalog_repo::{CategoryRepo, SiteRepo, ZoneRepo};
pub use log_repo::LogRepo;
pub use notification_repo::NotificationRepo;
pub use requisition_repo::RequisitionRepo;
pub use schedule_repo::ScheduleRepo;
pub use ticket_repo::TicketRepo;
pub use user_repo::UserRepo;
