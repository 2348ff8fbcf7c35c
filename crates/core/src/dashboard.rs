//! Operational KPIs computed over a ticket set.

use std::collections::HashMap;

use chrono::{Datelike, Months};
use serde::Serialize;

use crate::status::{TicketPriority, TicketStatus};
use crate::ticket::is_overdue;
use crate::types::Timestamp;

/// Ranked breakdowns keep this many entries.
pub const TOP_N: usize = 5;

/// Months covered by the creation trend, including the current one.
pub const TREND_MONTHS: u32 = 12;

/// The fields of a ticket the metrics look at.
#[derive(Debug, Clone)]
pub struct TicketFacts<'a> {
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: Timestamp,
    pub due_date: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub zone: &'a str,
    pub category: &'a str,
    pub requester: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityCompliance {
    pub priority: TicketPriority,
    pub finished: u64,
    pub on_time: u64,
    pub compliance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_tickets: u64,
    pub open_tickets: u64,
    pub overdue_tickets: u64,
    /// Percentage of resolved/closed tickets finished by their due date,
    /// rounded; 100 when nothing has been finished yet.
    pub sla_compliance: u32,
    /// Mean hours from creation to resolution, rounded.
    pub average_resolution_hours: i64,
    pub compliance_by_priority: Vec<PriorityCompliance>,
    pub tickets_by_zone: Vec<NamedCount>,
    pub top_requesters: Vec<NamedCount>,
    pub popular_categories: Vec<NamedCount>,
    /// `YYYY-MM` buckets, oldest first.
    pub tickets_by_month: Vec<NamedCount>,
}

fn is_finished(status: TicketStatus) -> bool {
    status.marks_resolution()
}

fn on_time(t: &TicketFacts<'_>) -> bool {
    t.resolved_at.is_some_and(|r| r <= t.due_date)
}

fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        100
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

fn count_by<'a, F>(tickets: &[TicketFacts<'a>], key: F, fallback: &str) -> Vec<NamedCount>
where
    F: Fn(&TicketFacts<'a>) -> &'a str,
{
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for t in tickets {
        let name = key(t).trim();
        let name = if name.is_empty() { fallback } else { name };
        *counts.entry(name).or_default() += 1;
    }
    let mut out: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, total)| NamedCount {
            name: name.to_string(),
            total,
        })
        .collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    out
}

fn month_key(ts: Timestamp) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

fn monthly_trend(tickets: &[TicketFacts<'_>], now: Timestamp) -> Vec<NamedCount> {
    let mut buckets: Vec<NamedCount> = (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| now.checked_sub_months(Months::new(back)))
        .map(|month| NamedCount {
            name: month_key(month),
            total: 0,
        })
        .collect();
    for t in tickets {
        let key = month_key(t.created_at);
        if let Some(bucket) = buckets.iter_mut().find(|b| b.name == key) {
            bucket.total += 1;
        }
    }
    buckets
}

/// Compute every dashboard KPI at instant `now`.
pub fn compute_metrics(tickets: &[TicketFacts<'_>], now: Timestamp) -> DashboardMetrics {
    let open_tickets = tickets.iter().filter(|t| !t.status.is_closed()).count() as u64;
    let overdue_tickets = tickets
        .iter()
        .filter(|t| is_overdue(t.status, t.due_date, now))
        .count() as u64;

    let finished: Vec<&TicketFacts<'_>> = tickets.iter().filter(|t| is_finished(t.status)).collect();
    let finished_on_time = finished.iter().filter(|t| on_time(t)).count() as u64;

    let resolution_ms: Vec<i64> = finished
        .iter()
        .filter_map(|t| t.resolved_at.map(|r| (r - t.created_at).num_milliseconds()))
        .collect();
    let average_resolution_hours = if resolution_ms.is_empty() {
        0
    } else {
        let mean_ms = resolution_ms.iter().sum::<i64>() as f64 / resolution_ms.len() as f64;
        (mean_ms / 3_600_000.0).round() as i64
    };

    let compliance_by_priority = TicketPriority::ALL
        .iter()
        .map(|&priority| {
            let of_priority = finished.iter().filter(|t| t.priority == priority);
            let finished_count = of_priority.clone().count() as u64;
            let on_time_count = of_priority.filter(|t| on_time(t)).count() as u64;
            PriorityCompliance {
                priority,
                finished: finished_count,
                on_time: on_time_count,
                compliance: percentage(on_time_count, finished_count),
            }
        })
        .collect();

    let mut top_requesters = count_by(tickets, |t| t.requester, "Desconocido");
    top_requesters.truncate(TOP_N);
    let mut popular_categories = count_by(tickets, |t| t.category, "Sin Categoría");
    popular_categories.truncate(TOP_N);

    DashboardMetrics {
        total_tickets: tickets.len() as u64,
        open_tickets,
        overdue_tickets,
        sla_compliance: percentage(finished_on_time, finished.len() as u64),
        average_resolution_hours,
        compliance_by_priority,
        tickets_by_zone: count_by(tickets, |t| t.zone, "Sin Zona"),
        top_requesters,
        popular_categories,
        tickets_by_month: monthly_trend(tickets, now),
    }
}
