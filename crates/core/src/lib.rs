//! Domain rules for the GemelliFix maintenance desk.
//!
//! Pure logic only: no database, HTTP or filesystem access. The `db` and `api`
//! crates call into here for every decision about statuses, permissions and
//! deadlines.

pub mod audit;
pub mod dashboard;
pub mod error;
pub mod paging;
pub mod requisition;
pub mod roles;
pub mod sla;
pub mod status;
pub mod storage;
pub mod ticket;
pub mod types;
pub mod validation;
