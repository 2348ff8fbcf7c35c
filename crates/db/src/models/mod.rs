//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` + `Serialize` struct per table, plus the
//! `Create*`/`Update*` inputs the repositories accept. Status, priority and
//! role columns are kept as their stored labels; callers parse them into the
//! `gemellifix_core` enums through the accessor methods.

pub mod catalog;
pub mod log;
pub mod notification;
pub mod requisition;
pub mod schedule;
pub mod ticket;
pub mod user;
