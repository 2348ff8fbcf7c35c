//! Requisition status aggregation and numbering.
//!
//! A requisition's status is never stored independently of its items: after
//! any item is added, removed, authorized or received, callers re-run
//! [`aggregate_status`] over the complete item list and persist the result.
//! The only status not derived from items is
//! [`RequisitionStatus::Rejected`], which an administrator sets explicitly
//! and which freezes the item list (see [`ensure_mutable`]).

use crate::error::CoreError;
use crate::status::RequisitionStatus;

/// Prefix of every requisition number (`REQ-2026-0001`).
pub const NUMBER_PREFIX: &str = "REQ";

/// Zero-padded width of the sequential part of a requisition number.
const SEQUENCE_WIDTH: usize = 4;

/// The approval/receipt flags of one requisition line.
///
/// Implemented by the database row and the API input types so the same
/// aggregation runs wherever the flags live.
pub trait ItemFlags {
    fn authorized(&self) -> bool;
    fn received(&self) -> bool;
}

/// Derive a requisition's status from its full, ordered item list.
///
/// Rules, in precedence order:
///
/// 1. nothing authorized and nothing received -> `Pendiente`
/// 2. every item authorized and every authorized item received -> `Completada`
/// 3. every item authorized -> `Aprobada`
/// 4. otherwise (some but not all authorized) -> `Parcialmente Aprobada`
///
/// Callers reject empty item lists before reaching this function; an empty
/// slice yields `Pendiente`.
pub fn aggregate_status<T: ItemFlags>(items: &[T]) -> RequisitionStatus {
    let authorized = items.iter().filter(|i| i.authorized()).count();
    let received = items.iter().filter(|i| i.received()).count();

    if authorized == 0 && received == 0 {
        return RequisitionStatus::Pending;
    }

    let all_authorized = authorized == items.len();
    let all_authorized_received = items
        .iter()
        .filter(|i| i.authorized())
        .all(|i| i.received());

    if all_authorized && all_authorized_received {
        RequisitionStatus::Completed
    } else if all_authorized {
        RequisitionStatus::Approved
    } else {
        RequisitionStatus::PartiallyApproved
    }
}

/// A line item as submitted, before it is stored.
pub trait ItemFields: ItemFlags {
    fn quantity(&self) -> i32;
    fn product(&self) -> &str;
}

/// Validate a full item list: non-empty, positive quantities, named products,
/// and no line received before it was authorized.
pub fn validate_items<T: ItemFields>(items: &[T]) -> Result<(), CoreError> {
    if items.is_empty() {
        return Err(CoreError::validation(
            "A requisition needs at least one item",
        ));
    }
    for (idx, item) in items.iter().enumerate() {
        validate_item(item).map_err(|e| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("Item {}: {msg}", idx + 1)),
            other => other,
        })?;
    }
    Ok(())
}

/// Validate a single line item.
pub fn validate_item<T: ItemFields>(item: &T) -> Result<(), CoreError> {
    if item.quantity() < 1 {
        return Err(CoreError::validation("quantity must be at least 1"));
    }
    if item.product().trim().is_empty() {
        return Err(CoreError::validation("product is required"));
    }
    check_receipt_invariant(item.authorized(), item.received())
}

/// A line cannot be received before it has been authorized.
pub fn check_receipt_invariant(authorized: bool, received: bool) -> Result<(), CoreError> {
    if received && !authorized {
        return Err(CoreError::validation(
            "an item cannot be received before it is authorized",
        ));
    }
    Ok(())
}

/// Rejected requisitions accept no further item changes.
pub fn ensure_mutable(status: RequisitionStatus) -> Result<(), CoreError> {
    if status == RequisitionStatus::Rejected {
        return Err(CoreError::Conflict(
            "Requisition was rejected and can no longer be modified".into(),
        ));
    }
    Ok(())
}

/// Format a requisition number, e.g. `REQ-2026-0007`.
pub fn format_number(year: i32, sequence: u32) -> String {
    format!(
        "{}-{}-{:0width$}",
        NUMBER_PREFIX,
        year,
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Extract the trailing sequence from a requisition number.
pub fn parse_sequence(number: &str) -> Option<u32> {
    let digits: String = number
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Number for the next requisition, continuing from the most recent one.
///
/// The sequence does not reset with the year; it follows whatever the last
/// stored number ends with.
pub fn next_number(last: Option<&str>, year: i32) -> String {
    let next = last.and_then(parse_sequence).map_or(1, |n| n + 1);
    format_number(year, next)
}
