pub mod admin;
pub mod ai;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod log;
pub mod notification;
pub mod requisition;
pub mod schedule;
pub mod ticket;
