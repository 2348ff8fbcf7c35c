//! Repository for the `tickets` table.
//!
//! Updates are plain last-write-wins statements keyed by id: the caller has
//! already validated the change against the row it read.

use gemellifix_core::paging::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use gemellifix_core::status::{TicketPriority, TicketStatus};
use gemellifix_core::types::{Attachment, DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::ticket::{CreateTicket, Ticket, TicketFilter};

const COLUMNS: &str = "\
    id, code, title, description, category, zone, site, priority, status, \
    requester_id, requester_name, assignee_ids, assignee_names, attachments, evidence, \
    created_at, due_date, resolved_at, updated_at";

pub struct TicketRepo;

impl TicketRepo {
    pub async fn create(pool: &PgPool, input: &CreateTicket) -> Result<Ticket, sqlx::Error> {
        let query = format!(
            "INSERT INTO tickets (code, title, description, category, zone, site, priority, \
                                  requester_id, requester_name, attachments, created_at, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(&input.code)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(&input.zone)
            .bind(&input.site)
            .bind(input.priority.as_str())
            .bind(input.requester_id)
            .bind(&input.requester_name)
            .bind(Json(&input.attachments))
            .bind(input.created_at)
            .bind(input.due_date)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first, filtered and paginated.
    pub async fn list(pool: &PgPool, filter: &TicketFilter) -> Result<Vec<Ticket>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM tickets
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::TEXT IS NULL OR priority = $2)
               AND ($3::BIGINT IS NULL OR requester_id = $3 OR $3 = ANY(assignee_ids))
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(&filter.status)
            .bind(&filter.priority)
            .bind(filter.visible_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every ticket, for dashboard metrics.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets ORDER BY created_at");
        sqlx::query_as::<_, Ticket>(&query).fetch_all(pool).await
    }

    /// Per technician, how many unfinished tickets list them as assignee.
    /// Technicians with none are absent.
    pub async fn open_assignment_counts(pool: &PgPool) -> Result<Vec<(DbId, i64)>, sqlx::Error> {
        let closed: Vec<&str> = TicketStatus::ALL
            .iter()
            .filter(|s| s.is_closed())
            .map(|s| s.as_str())
            .collect();
        sqlx::query_as::<_, (DbId, i64)>(
            "SELECT assignee_id, COUNT(*)::BIGINT
             FROM tickets, UNNEST(assignee_ids) AS assignee_id
             WHERE status <> ALL($1)
             GROUP BY assignee_id",
        )
        .bind(&closed)
        .fetch_all(pool)
        .await
    }

    /// Set the status. Entering a resolution status stamps `resolved_at`
    /// unless it is already set.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: TicketStatus,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET
                status = $2,
                resolved_at = CASE WHEN $3 THEN COALESCE(resolved_at, NOW()) ELSE resolved_at END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(status.marks_resolution())
            .fetch_optional(pool)
            .await
    }

    pub async fn update_priority(
        pool: &PgPool,
        id: DbId,
        priority: TicketPriority,
        due_date: Timestamp,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET priority = $2, due_date = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(priority.as_str())
            .bind(due_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_category(
        pool: &PgPool,
        id: DbId,
        category: &str,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET category = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(category)
            .fetch_optional(pool)
            .await
    }

    /// Replace the assignee lists and set the status that follows from them.
    pub async fn set_assignees(
        pool: &PgPool,
        id: DbId,
        assignee_ids: &[DbId],
        assignee_names: &[String],
        status: TicketStatus,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET assignee_ids = $2, assignee_names = $3, status = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(assignee_ids)
            .bind(assignee_names)
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn append_attachments(
        pool: &PgPool,
        id: DbId,
        files: &[Attachment],
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET attachments = attachments || $2::JSONB, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(Json(files))
            .fetch_optional(pool)
            .await
    }

    /// Append evidence files and move the ticket to `status` in one statement.
    pub async fn submit_evidence(
        pool: &PgPool,
        id: DbId,
        files: &[Attachment],
        status: TicketStatus,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET evidence = evidence || $2::JSONB, status = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(Json(files))
            .bind(status.as_str())
            .fetch_optional(pool)
            .await
    }
}
