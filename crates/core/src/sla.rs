//! Service-level deadlines and ticket codes.

use chrono::Duration;
use rand::Rng;

use crate::status::TicketPriority;
use crate::types::Timestamp;

/// Hours allowed to resolve a ticket of the given priority.
pub fn resolution_hours(priority: TicketPriority) -> i64 {
    match priority {
        TicketPriority::Urgent => 12,
        TicketPriority::High => 24,
        TicketPriority::Medium => 36,
        TicketPriority::Low => 48,
    }
}

/// Due date for a ticket created at `created_at`.
///
/// Always measured from creation, so re-prioritizing a ticket moves its
/// deadline relative to when it was opened, not to when it was edited.
pub fn due_date_for(priority: TicketPriority, created_at: Timestamp) -> Timestamp {
    created_at + Duration::hours(resolution_hours(priority))
}

// ---------------------------------------------------------------------------
// Ticket codes
// ---------------------------------------------------------------------------

pub const CODE_PREFIX: &str = "GEMMAN";
const ZONE_FALLBACK: &str = "ZONA";
const SITE_FALLBACK: &str = "SITE";
const SEGMENT_LEN: usize = 4;

/// First four non-whitespace characters of `name`, uppercased.
fn code_segment(name: &str, fallback: &str) -> String {
    let segment: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(SEGMENT_LEN)
        .flat_map(char::to_uppercase)
        .collect();
    if segment.is_empty() {
        fallback.to_string()
    } else {
        segment
    }
}

/// Human-facing ticket code, e.g. `GEMMAN-BLOQ-LABO-4821`.
///
/// The numeric suffix is random and not guaranteed unique; the database id
/// remains the ticket's identity.
pub fn generate_ticket_code(zone: &str, site: &str) -> String {
    let suffix: u32 = rand::rng().random_range(1000..=9999);
    format_ticket_code(zone, site, suffix)
}

pub fn format_ticket_code(zone: &str, site: &str, suffix: u32) -> String {
    format!(
        "{CODE_PREFIX}-{}-{}-{suffix}",
        code_segment(zone, ZONE_FALLBACK),
        code_segment(site, SITE_FALLBACK)
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn due_dates_per_priority() {
        let created = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        assert_eq!(
            due_date_for(TicketPriority::Urgent, created),
            Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap()
        );
        assert_eq!(
            due_date_for(TicketPriority::High, created),
            Utc.with_ymd_and_hms(2026, 3, 3, 8, 0, 0).unwrap()
        );
        assert_eq!(
            due_date_for(TicketPriority::Medium, created),
            Utc.with_ymd_and_hms(2026, 3, 3, 20, 0, 0).unwrap()
        );
        assert_eq!(
            due_date_for(TicketPriority::Low, created),
            Utc.with_ymd_and_hms(2026, 3, 4, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn due_date_always_after_creation() {
        let created = Utc::now();
        for p in TicketPriority::ALL {
            assert!(due_date_for(*p, created) > created);
        }
    }

    #[test]
    fn code_uses_first_four_letters() {
        assert_eq!(
            format_ticket_code("Bloque A", "Laboratorio", 4821),
            "GEMMAN-BLOQ-LABO-4821"
        );
    }

    #[test]
    fn code_strips_whitespace_before_truncating() {
        assert_eq!(format_ticket_code("B A", "s 1", 1000), "GEMMAN-BA-S1-1000");
    }

    #[test]
    fn code_falls_back_for_blank_names() {
        assert_eq!(format_ticket_code("", "  ", 9999), "GEMMAN-ZONA-SITE-9999");
    }

    #[test]
    fn generated_suffix_in_range() {
        for _ in 0..50 {
            let code = generate_ticket_code("Sede", "Cancha");
            let suffix: u32 = code.rsplit('-').next().unwrap().parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
        }
    }
}
