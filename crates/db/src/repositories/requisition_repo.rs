//! Repository for `requisitions` and `requisition_items`.
//!
//! Every item mutation ends with [`RequisitionRepo::refresh_status`], which
//! re-derives the stored status from the full item list inside the same
//! transaction.

use chrono::Utc;
use gemellifix_core::paging::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use gemellifix_core::requisition::aggregate_status;
use gemellifix_core::status::RequisitionStatus;
use gemellifix_core::types::{Attachment, DbId, Timestamp};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::requisition::{
    CreateRequisition, CreateRequisitionItem, ItemRemoval, Requisition, RequisitionDetail,
    RequisitionFilter, RequisitionItem, UpdateRequisitionItem,
};

const COLUMNS: &str = "\
    id, number, requester_id, requester_name, request_date, cost_center, description, \
    attachments, status, created_at, updated_at";

const ITEM_COLUMNS: &str = "\
    id, requisition_id, position, quantity, product, description, \
    authorized, authorized_at, received, received_at";

pub struct RequisitionRepo;

impl RequisitionRepo {
    /// Most recently created requisition number, if any.
    pub async fn latest_number(pool: &PgPool) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT number FROM requisitions ORDER BY id DESC LIMIT 1")
            .fetch_optional(pool)
            .await
    }

    /// Insert a requisition with its items and derived status.
    ///
    /// A concurrent insert of the same number fails on `uq_requisitions_number`.
    pub async fn create(
        pool: &PgPool,
        number: &str,
        requester_id: DbId,
        requester_name: &str,
        input: &CreateRequisition,
    ) -> Result<RequisitionDetail, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO requisitions (number, requester_id, requester_name, request_date, \
                                       cost_center, description, status)
             VALUES ($1, $2, $3, COALESCE($4, NOW()), $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let requisition = sqlx::query_as::<_, Requisition>(&query)
            .bind(number)
            .bind(requester_id)
            .bind(requester_name)
            .bind(input.request_date)
            .bind(&input.cost_center)
            .bind(&input.description)
            .bind(aggregate_status(&input.items).as_str())
            .fetch_one(&mut *tx)
            .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (position, item) in input.items.iter().enumerate() {
            items.push(insert_item(&mut tx, requisition.id, position as i32, item).await?);
        }

        tx.commit().await?;
        Ok(RequisitionDetail { requisition, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Requisition>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requisitions WHERE id = $1");
        sqlx::query_as::<_, Requisition>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RequisitionDetail>, sqlx::Error> {
        let Some(requisition) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::items(pool, id).await?;
        Ok(Some(RequisitionDetail { requisition, items }))
    }

    pub async fn items(pool: &PgPool, requisition_id: DbId) -> Result<Vec<RequisitionItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM requisition_items
             WHERE requisition_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, RequisitionItem>(&query)
            .bind(requisition_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &RequisitionFilter,
    ) -> Result<Vec<Requisition>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(filter.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM requisitions
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Requisition>(&query)
            .bind(&filter.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Append one item at the end of the list and refresh the status.
    pub async fn add_item(
        pool: &PgPool,
        requisition_id: DbId,
        item: &CreateRequisitionItem,
    ) -> Result<RequisitionItem, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM requisition_items WHERE requisition_id = $1",
        )
        .bind(requisition_id)
        .fetch_one(&mut *tx)
        .await?;
        let created = insert_item(&mut tx, requisition_id, position, item).await?;
        Self::refresh_status(&mut tx, requisition_id).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Apply a patch to one item and refresh the status.
    ///
    /// `authorized_at`/`received_at` follow their flags: set when a flag turns
    /// on, cleared when it turns off. Returns `None` if the item does not
    /// belong to the requisition.
    pub async fn update_item(
        pool: &PgPool,
        requisition_id: DbId,
        item_id: DbId,
        patch: &UpdateRequisitionItem,
    ) -> Result<Option<RequisitionItem>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();
        let query = format!(
            "UPDATE requisition_items SET
                quantity = COALESCE($3, quantity),
                product = COALESCE($4, product),
                description = COALESCE($5, description),
                authorized_at = CASE
                    WHEN $6::BOOLEAN IS NULL THEN authorized_at
                    WHEN $6 AND NOT authorized THEN $8
                    WHEN $6 THEN authorized_at
                    ELSE NULL END,
                authorized = COALESCE($6, authorized),
                received_at = CASE
                    WHEN $7::BOOLEAN IS NULL THEN received_at
                    WHEN $7 AND NOT received THEN $8
                    WHEN $7 THEN received_at
                    ELSE NULL END,
                received = COALESCE($7, received)
             WHERE id = $2 AND requisition_id = $1
             RETURNING {ITEM_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, RequisitionItem>(&query)
            .bind(requisition_id)
            .bind(item_id)
            .bind(patch.quantity)
            .bind(patch.product.as_deref().map(str::trim))
            .bind(&patch.description)
            .bind(patch.authorized)
            .bind(patch.received)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;
        if updated.is_some() {
            Self::refresh_status(&mut tx, requisition_id).await?;
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// Remove one item unless it is the last one left.
    ///
    /// Holds the requisition row lock while counting, so concurrent deletes
    /// cannot empty the list.
    pub async fn delete_item(
        pool: &PgPool,
        requisition_id: DbId,
        item_id: DbId,
    ) -> Result<ItemRemoval, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT id FROM requisitions WHERE id = $1 FOR UPDATE")
            .bind(requisition_id)
            .execute(&mut *tx)
            .await?;

        let (count, exists): (i64, bool) = sqlx::query_as(
            "SELECT COUNT(*)::BIGINT, COALESCE(BOOL_OR(id = $2), false)
             FROM requisition_items WHERE requisition_id = $1",
        )
        .bind(requisition_id)
        .bind(item_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Ok(ItemRemoval::NotFound);
        }
        if count <= 1 {
            return Ok(ItemRemoval::LastItem);
        }

        sqlx::query("DELETE FROM requisition_items WHERE id = $2 AND requisition_id = $1")
            .bind(requisition_id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        Self::refresh_status(&mut tx, requisition_id).await?;
        tx.commit().await?;
        Ok(ItemRemoval::Removed)
    }

    /// Mark a requisition rejected. Item flags are left as they were.
    pub async fn reject(pool: &PgPool, id: DbId) -> Result<Option<Requisition>, sqlx::Error> {
        let query = format!(
            "UPDATE requisitions SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Requisition>(&query)
            .bind(id)
            .bind(RequisitionStatus::Rejected.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn append_attachments(
        pool: &PgPool,
        id: DbId,
        files: &[Attachment],
    ) -> Result<Option<Requisition>, sqlx::Error> {
        let query = format!(
            "UPDATE requisitions SET attachments = attachments || $2::JSONB, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Requisition>(&query)
            .bind(id)
            .bind(Json(files))
            .fetch_optional(pool)
            .await
    }

    /// Re-derive and store the status from the requisition's current items.
    ///
    /// A rejection that landed in the meantime is kept.
    pub async fn refresh_status(
        conn: &mut PgConnection,
        requisition_id: DbId,
    ) -> Result<RequisitionStatus, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM requisition_items
             WHERE requisition_id = $1 ORDER BY position, id"
        );
        let items = sqlx::query_as::<_, RequisitionItem>(&query)
            .bind(requisition_id)
            .fetch_all(&mut *conn)
            .await?;
        let status = aggregate_status(&items);
        sqlx::query(
            "UPDATE requisitions SET status = $2, updated_at = NOW()
             WHERE id = $1 AND status <> $3",
        )
            .bind(requisition_id)
            .bind(status.as_str())
            .bind(RequisitionStatus::Rejected.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(status)
    }
}

async fn insert_item(
    conn: &mut PgConnection,
    requisition_id: DbId,
    position: i32,
    item: &CreateRequisitionItem,
) -> Result<RequisitionItem, sqlx::Error> {
    let now: Timestamp = Utc::now();
    let query = format!(
        "INSERT INTO requisition_items (requisition_id, position, quantity, product, description, \
                                        authorized, authorized_at, received, received_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {ITEM_COLUMNS}"
    );
    sqlx::query_as::<_, RequisitionItem>(&query)
        .bind(requisition_id)
        .bind(position)
        .bind(item.quantity)
        .bind(item.product.trim())
        .bind(&item.description)
        .bind(item.authorized)
        .bind(item.authorized.then_some(now))
        .bind(item.received)
        .bind(item.received.then_some(now))
        .fetch_one(conn)
        .await
}
