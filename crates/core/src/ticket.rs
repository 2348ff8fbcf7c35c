//! Ticket lifecycle: transition table, permission rules, and the transition
//! advisor that suggests a ticket's next status.
//!
//! ```text
//! Abierto -> Asignado -> En Progreso -> Resuelto -> Cerrado
//!               |             |
//!               +-------------+--> Requiere Aprobación --approve--> Cerrado
//!                                          |
//!                                          +---reject---> Asignado
//! ```
//!
//! Any non-final ticket except one awaiting approval may also be cancelled by
//! an administrator.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::status::TicketStatus;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Statuses reachable from `from` in one step, for any actor.
pub fn valid_transitions(from: TicketStatus) -> &'static [TicketStatus] {
    use TicketStatus::*;
    match from {
        Open => &[Assigned, Cancelled],
        Assigned => &[InProgress, RequiresApproval, Open, Cancelled],
        InProgress => &[Resolved, RequiresApproval, Cancelled],
        RequiresApproval => &[Closed, Assigned],
        Resolved => &[Closed],
        Closed | Cancelled => &[],
    }
}

pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// The next status on the main chain, if any.
///
/// `Requiere Aprobación` answers with its approval outcome (`Cerrado`); the
/// rejection branch is reported separately by [`advise`].
pub fn next_status(status: TicketStatus) -> Option<TicketStatus> {
    use TicketStatus::*;
    match status {
        Open => Some(Assigned),
        Assigned => Some(InProgress),
        InProgress => Some(Resolved),
        Resolved => Some(Closed),
        RequiresApproval => Some(Closed),
        Closed | Cancelled => None,
    }
}

// ---------------------------------------------------------------------------
// Advisor
// ---------------------------------------------------------------------------

/// What the advisor recommends doing with a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Move the ticket to `suggested_status`.
    Advance,
    /// The requester must approve (`suggested_status`) or reject
    /// (`alternative_status`) the work.
    AwaitApproval,
    /// The ticket is overdue: a person has to decide between reassigning and
    /// escalating. No automatic transition is offered.
    Investigate,
    /// Nothing left to do.
    None,
}

/// Result of [`advise`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionAdvice {
    pub status: TicketStatus,
    pub overdue: bool,
    pub recommendation: Recommendation,
    pub suggested_status: Option<TicketStatus>,
    pub alternative_status: Option<TicketStatus>,
    /// Whether the suggestion is a state change the caller can apply directly.
    pub is_actionable: bool,
}

/// A ticket is overdue once `now` passes its due date, unless it has already
/// been resolved, closed or cancelled.
pub fn is_overdue(status: TicketStatus, due_date: Timestamp, now: Timestamp) -> bool {
    now > due_date && !status.is_closed()
}

/// Suggest the next step for a ticket.
pub fn advise(status: TicketStatus, due_date: Timestamp, now: Timestamp) -> TransitionAdvice {
    if is_overdue(status, due_date, now) {
        return TransitionAdvice {
            status,
            overdue: true,
            recommendation: Recommendation::Investigate,
            suggested_status: None,
            alternative_status: None,
            is_actionable: false,
        };
    }

    let (recommendation, alternative_status) = match status {
        TicketStatus::RequiresApproval => {
            (Recommendation::AwaitApproval, Some(TicketStatus::Assigned))
        }
        s if s.is_final() => (Recommendation::None, None),
        _ => (Recommendation::Advance, None),
    };
    let suggested_status = next_status(status);

    TransitionAdvice {
        status,
        overdue: false,
        recommendation,
        suggested_status,
        alternative_status,
        is_actionable: suggested_status.is_some(),
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// The user attempting a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

/// Who owns and who works a ticket.
#[derive(Debug, Clone, Copy)]
pub struct TicketParties<'a> {
    pub requester_id: DbId,
    pub assignee_ids: &'a [DbId],
}

impl TicketParties<'_> {
    pub fn is_assignee(&self, user_id: DbId) -> bool {
        self.assignee_ids.contains(&user_id)
    }
}

/// Whether `actor` may modify the ticket at all (fields, assignment,
/// attachments). Requesters only act through approval.
pub fn can_edit(actor: Actor, parties: TicketParties<'_>) -> bool {
    actor.role.is_admin() || (actor.role.is_technician() && parties.is_assignee(actor.user_id))
}

/// Whether `actor` may read the ticket.
pub fn can_view(actor: Actor, parties: TicketParties<'_>) -> bool {
    actor.role.sees_all_tickets()
        || actor.user_id == parties.requester_id
        || parties.is_assignee(actor.user_id)
}

/// Check that `actor` may move a ticket from `from` to `to`.
///
/// - The move must exist in [`valid_transitions`].
/// - Administrators may take any such move.
/// - The assigned technician may only move forward (no cancelling, no
///   reopening, no approval decisions) and must leave a progress comment
///   unless the ticket is leaving `Asignado`.
/// - The requester may only approve or reject a ticket awaiting approval.
/// - Everyone else, including SST, is refused.
pub fn authorize_transition(
    actor: Actor,
    parties: TicketParties<'_>,
    from: TicketStatus,
    to: TicketStatus,
    comment: Option<&str>,
) -> Result<(), CoreError> {
    if !can_transition(from, to) {
        return Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    if actor.role.is_admin() {
        return Ok(());
    }

    if actor.role.is_technician() && parties.is_assignee(actor.user_id) {
        let technician_move = matches!(
            (from, to),
            (TicketStatus::Assigned, TicketStatus::InProgress)
                | (TicketStatus::Assigned, TicketStatus::RequiresApproval)
                | (TicketStatus::InProgress, TicketStatus::Resolved)
                | (TicketStatus::InProgress, TicketStatus::RequiresApproval)
        );
        if !technician_move {
            return Err(CoreError::Forbidden(format!(
                "Assigned personnel cannot move a ticket from '{from}' to '{to}'"
            )));
        }
        let has_comment = comment.is_some_and(|c| !c.trim().is_empty());
        if from != TicketStatus::Assigned && !has_comment {
            return Err(CoreError::validation(
                "A progress comment is required to change the status",
            ));
        }
        return Ok(());
    }

    if actor.user_id == parties.requester_id && from == TicketStatus::RequiresApproval {
        // Both targets out of RequiresApproval are approval decisions.
        return Ok(());
    }

    Err(CoreError::Forbidden(
        "Only an administrator or the assigned personnel can change this ticket's status".into(),
    ))
}

/// Status after an assignment change: `Asignado` with at least one assignee,
/// `Abierto` with none.
///
/// Tickets past assignment (in progress, awaiting approval, resolved) keep
/// their status when the crew changes; final tickets cannot be reassigned.
pub fn status_after_assignment(
    current: TicketStatus,
    assignee_count: usize,
) -> Result<TicketStatus, CoreError> {
    if current.is_final() {
        return Err(CoreError::Conflict(format!(
            "Cannot reassign a ticket in status '{current}'"
        )));
    }
    Ok(match current {
        TicketStatus::Open | TicketStatus::Assigned => {
            if assignee_count > 0 {
                TicketStatus::Assigned
            } else {
                TicketStatus::Open
            }
        }
        other => other,
    })
}

/// Evidence of finished work can be submitted while the ticket is being
/// worked on; it moves the ticket to `Requiere Aprobación`.
pub fn ensure_evidence_allowed(status: TicketStatus) -> Result<(), CoreError> {
    match status {
        TicketStatus::Assigned | TicketStatus::InProgress => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "Evidence can only be submitted for tickets that are '{}' or '{}', not '{other}'",
            TicketStatus::Assigned,
            TicketStatus::InProgress
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    const ADMIN: Actor = Actor {
        user_id: 1,
        role: Role::Admin,
    };
    const TECH: Actor = Actor {
        user_id: 2,
        role: Role::GeneralServices,
    };
    const OTHER_TECH: Actor = Actor {
        user_id: 3,
        role: Role::GeneralServices,
    };
    const REQUESTER: Actor = Actor {
        user_id: 4,
        role: Role::Teacher,
    };
    const SST: Actor = Actor {
        user_id: 5,
        role: Role::Sst,
    };

    fn parties(assignees: &[DbId]) -> TicketParties<'_> {
        TicketParties {
            requester_id: REQUESTER.user_id,
            assignee_ids: assignees,
        }
    }

    // -- advisor ------------------------------------------------------------------

    #[test]
    fn open_ticket_due_next_week_suggests_assignment() {
        let now = Utc::now();
        let advice = advise(TicketStatus::Open, now + Duration::days(7), now);
        assert!(!advice.overdue);
        assert_eq!(advice.suggested_status, Some(TicketStatus::Assigned));
        assert_eq!(advice.recommendation, Recommendation::Advance);
        assert!(advice.is_actionable);
    }

    #[test]
    fn overdue_tickets_are_never_actionable() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        for status in [
            TicketStatus::Open,
            TicketStatus::Assigned,
            TicketStatus::InProgress,
            TicketStatus::RequiresApproval,
        ] {
            let advice = advise(status, past, now);
            assert!(advice.overdue, "{status} should be overdue");
            assert!(!advice.is_actionable);
            assert_eq!(advice.recommendation, Recommendation::Investigate);
            assert_eq!(advice.suggested_status, None);
        }
    }

    #[test]
    fn linear_chain_suggestions() {
        let now = Utc::now();
        let due = now + Duration::hours(5);
        let expect = [
            (TicketStatus::Assigned, TicketStatus::InProgress),
            (TicketStatus::InProgress, TicketStatus::Resolved),
            (TicketStatus::Resolved, TicketStatus::Closed),
        ];
        for (from, to) in expect {
            assert_eq!(advise(from, due, now).suggested_status, Some(to));
        }
    }

    #[test]
    fn awaiting_approval_offers_both_outcomes() {
        let now = Utc::now();
        let advice = advise(TicketStatus::RequiresApproval, now + Duration::hours(1), now);
        assert_eq!(advice.recommendation, Recommendation::AwaitApproval);
        assert_eq!(advice.suggested_status, Some(TicketStatus::Closed));
        assert_eq!(advice.alternative_status, Some(TicketStatus::Assigned));
        assert!(advice.is_actionable);
    }

    #[test]
    fn resolved_past_due_is_not_overdue() {
        let now = Utc::now();
        let advice = advise(TicketStatus::Resolved, now - Duration::days(3), now);
        assert!(!advice.overdue);
        assert_eq!(advice.suggested_status, Some(TicketStatus::Closed));
    }

    #[test]
    fn final_statuses_have_nothing_to_suggest() {
        let now = Utc::now();
        for status in [TicketStatus::Closed, TicketStatus::Cancelled] {
            let advice = advise(status, now - Duration::days(1), now);
            assert!(!advice.overdue);
            assert_eq!(advice.recommendation, Recommendation::None);
            assert!(!advice.is_actionable);
        }
    }

    #[test]
    fn due_exactly_now_is_not_overdue() {
        let now = Utc::now();
        assert!(!is_overdue(TicketStatus::Open, now, now));
    }

    // -- transition table -----------------------------------------------------------

    #[test]
    fn final_statuses_have_no_exits() {
        assert!(valid_transitions(TicketStatus::Closed).is_empty());
        assert!(valid_transitions(TicketStatus::Cancelled).is_empty());
    }

    #[test]
    fn next_status_is_always_a_valid_transition() {
        for status in TicketStatus::ALL {
            if let Some(next) = next_status(*status) {
                assert!(can_transition(*status, next), "{status} -> {next}");
            }
        }
    }

    // -- permissions ------------------------------------------------------------------

    #[test]
    fn admin_may_take_any_table_edge() {
        let p = parties(&[]);
        assert!(authorize_transition(ADMIN, p, TicketStatus::Open, TicketStatus::Cancelled, None).is_ok());
        assert!(authorize_transition(ADMIN, p, TicketStatus::Assigned, TicketStatus::Open, None).is_ok());
    }

    #[test]
    fn admin_cannot_skip_the_table() {
        let result =
            authorize_transition(ADMIN, parties(&[]), TicketStatus::Open, TicketStatus::Closed, None);
        assert_matches!(result, Err(CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn assigned_technician_starts_work_without_comment() {
        let ids = [TECH.user_id];
        assert!(authorize_transition(
            TECH,
            parties(&ids),
            TicketStatus::Assigned,
            TicketStatus::InProgress,
            None
        )
        .is_ok());
    }

    #[test]
    fn technician_needs_comment_to_resolve() {
        let ids = [TECH.user_id];
        let missing = authorize_transition(
            TECH,
            parties(&ids),
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            Some("  "),
        );
        assert_matches!(missing, Err(CoreError::Validation(_)));

        let with_comment = authorize_transition(
            TECH,
            parties(&ids),
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            Some("Se cambió el breaker"),
        );
        assert!(with_comment.is_ok());
    }

    #[test]
    fn technician_cannot_cancel_or_reopen() {
        let ids = [TECH.user_id];
        assert_matches!(
            authorize_transition(TECH, parties(&ids), TicketStatus::Assigned, TicketStatus::Cancelled, Some("x")),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            authorize_transition(TECH, parties(&ids), TicketStatus::Assigned, TicketStatus::Open, Some("x")),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn technician_cannot_approve_own_work() {
        let ids = [TECH.user_id];
        assert_matches!(
            authorize_transition(
                TECH,
                parties(&ids),
                TicketStatus::RequiresApproval,
                TicketStatus::Closed,
                Some("listo")
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn unassigned_technician_is_refused() {
        let ids = [TECH.user_id];
        assert_matches!(
            authorize_transition(
                OTHER_TECH,
                parties(&ids),
                TicketStatus::Assigned,
                TicketStatus::InProgress,
                None
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn requester_approves_or_rejects_only_from_requires_approval() {
        let ids = [TECH.user_id];
        let p = parties(&ids);
        assert!(authorize_transition(REQUESTER, p, TicketStatus::RequiresApproval, TicketStatus::Closed, None).is_ok());
        assert!(authorize_transition(REQUESTER, p, TicketStatus::RequiresApproval, TicketStatus::Assigned, None).is_ok());
        assert_matches!(
            authorize_transition(REQUESTER, p, TicketStatus::Open, TicketStatus::Cancelled, None),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn rejection_returns_to_assigned_not_open() {
        assert!(can_transition(TicketStatus::RequiresApproval, TicketStatus::Assigned));
        assert!(!can_transition(TicketStatus::RequiresApproval, TicketStatus::Open));
    }

    #[test]
    fn sst_is_read_only() {
        let ids = [TECH.user_id];
        let p = parties(&ids);
        assert!(can_view(SST, p));
        assert!(!can_edit(SST, p));
        assert_matches!(
            authorize_transition(SST, p, TicketStatus::Open, TicketStatus::Assigned, None),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn visibility_rules() {
        let ids = [TECH.user_id];
        let p = parties(&ids);
        assert!(can_view(REQUESTER, p));
        assert!(can_view(TECH, p));
        assert!(!can_view(OTHER_TECH, p));
        assert!(can_edit(TECH, p));
        assert!(!can_edit(REQUESTER, p));
    }

    // -- assignment / evidence ----------------------------------------------------------

    #[test]
    fn assignment_moves_between_open_and_assigned() {
        assert_eq!(status_after_assignment(TicketStatus::Open, 2).unwrap(), TicketStatus::Assigned);
        assert_eq!(status_after_assignment(TicketStatus::Assigned, 0).unwrap(), TicketStatus::Open);
    }

    #[test]
    fn assignment_keeps_in_progress_status() {
        assert_eq!(
            status_after_assignment(TicketStatus::InProgress, 1).unwrap(),
            TicketStatus::InProgress
        );
    }

    #[test]
    fn closed_ticket_cannot_be_reassigned() {
        assert_matches!(
            status_after_assignment(TicketStatus::Closed, 1),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn evidence_only_while_working() {
        assert!(ensure_evidence_allowed(TicketStatus::Assigned).is_ok());
        assert!(ensure_evidence_allowed(TicketStatus::InProgress).is_ok());
        assert!(ensure_evidence_allowed(TicketStatus::Open).is_err());
        assert!(ensure_evidence_allowed(TicketStatus::Closed).is_err());
    }
}
