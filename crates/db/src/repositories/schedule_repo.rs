//! Repository for the `schedule_events` table.

use gemellifix_core::status::ScheduleEventKind;
use gemellifix_core::types::DbId;
use sqlx::PgPool;

use crate::models::schedule::{CreateScheduleEvent, ScheduleEvent, ScheduleQuery};

const COLUMNS: &str = "\
    id, title, description, starts_at, ends_at, kind, technician_id, ticket_id, \
    created_by, created_at";

pub struct ScheduleRepo;

impl ScheduleRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateScheduleEvent,
        kind: ScheduleEventKind,
        created_by: DbId,
    ) -> Result<ScheduleEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedule_events (title, description, starts_at, ends_at, kind, \
                                          technician_id, ticket_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleEvent>(&query)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(kind.as_str())
            .bind(input.technician_id)
            .bind(input.ticket_id)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Events overlapping `[from, to)`, earliest first. Open bounds are
    /// unbounded.
    pub async fn list(pool: &PgPool, params: &ScheduleQuery) -> Result<Vec<ScheduleEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM schedule_events
             WHERE ($1::TIMESTAMPTZ IS NULL OR ends_at > $1)
               AND ($2::TIMESTAMPTZ IS NULL OR starts_at < $2)
               AND ($3::BIGINT IS NULL OR technician_id = $3)
             ORDER BY starts_at, id"
        );
        sqlx::query_as::<_, ScheduleEvent>(&query)
            .bind(params.from)
            .bind(params.to)
            .bind(params.technician_id)
            .fetch_all(pool)
            .await
    }

    /// Returns `true` if the event existed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM schedule_events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
