//! Repositories for `zones`, `sites` and `categories`.

use gemellifix_core::types::DbId;
use sqlx::PgPool;

use crate::models::catalog::{Category, Site, Zone};

pub struct ZoneRepo;

impl ZoneRepo {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Zone, sqlx::Error> {
        sqlx::query_as::<_, Zone>(
            "INSERT INTO zones (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>("SELECT id, name, created_at FROM zones WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tickets keep the zone name they were filed with.
    pub async fn rename(pool: &PgPool, id: DbId, name: &str) -> Result<Option<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>(
            "UPDATE zones SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Zone>, sqlx::Error> {
        sqlx::query_as::<_, Zone>("SELECT id, name, created_at FROM zones ORDER BY name")
            .fetch_all(pool)
            .await
    }
}

pub struct SiteRepo;

impl SiteRepo {
    pub async fn create(pool: &PgPool, zone_id: DbId, name: &str) -> Result<Site, sqlx::Error> {
        sqlx::query_as::<_, Site>(
            "INSERT INTO sites (zone_id, name) VALUES ($1, $2)
             RETURNING id, zone_id, name, created_at",
        )
        .bind(zone_id)
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Site>, sqlx::Error> {
        sqlx::query_as::<_, Site>("SELECT id, zone_id, name, created_at FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn rename(pool: &PgPool, id: DbId, name: &str) -> Result<Option<Site>, sqlx::Error> {
        sqlx::query_as::<_, Site>(
            "UPDATE sites SET name = $2 WHERE id = $1 RETURNING id, zone_id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// All sites, or only those of one zone.
    pub async fn list(pool: &PgPool, zone_id: Option<DbId>) -> Result<Vec<Site>, sqlx::Error> {
        sqlx::query_as::<_, Site>(
            "SELECT id, zone_id, name, created_at FROM sites
             WHERE ($1::BIGINT IS NULL OR zone_id = $1)
             ORDER BY name",
        )
        .bind(zone_id)
        .fetch_all(pool)
        .await
    }
}

pub struct CategoryRepo;

impl CategoryRepo {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
