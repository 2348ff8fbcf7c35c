//! Repository for the write-once `logs` table.

use gemellifix_core::paging::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use gemellifix_core::types::DbId;
use sqlx::PgPool;

use crate::models::log::{CreateLogEntry, LogEntry, LogQuery};

const COLUMNS: &str = "id, user_id, user_name, user_email, action, details, ticket_id, created_at";

pub struct LogRepo;

impl LogRepo {
    /// Insert one entry. The timestamp is assigned by the database.
    pub async fn insert(pool: &PgPool, entry: &CreateLogEntry) -> Result<LogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO logs (user_id, user_name, user_email, action, details, ticket_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LogEntry>(&query)
            .bind(entry.user_id)
            .bind(&entry.user_name)
            .bind(&entry.user_email)
            .bind(&entry.action)
            .bind(&entry.details)
            .bind(entry.ticket_id)
            .fetch_one(pool)
            .await
    }

    /// Newest first.
    pub async fn query(pool: &PgPool, params: &LogQuery) -> Result<Vec<LogEntry>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM logs
             WHERE ($1::TEXT IS NULL OR action = $1)
               AND ($2::BIGINT IS NULL OR ticket_id = $2)
               AND ($3::BIGINT IS NULL OR user_id = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, LogEntry>(&query)
            .bind(&params.action)
            .bind(params.ticket_id)
            .bind(params.user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Full history of one ticket, oldest first.
    pub async fn for_ticket(pool: &PgPool, ticket_id: DbId) -> Result<Vec<LogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM logs WHERE ticket_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, LogEntry>(&query)
            .bind(ticket_id)
            .fetch_all(pool)
            .await
    }
}
