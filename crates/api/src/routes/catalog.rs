use axum::routing::{get, put};
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes, merged at the `/api/v1` root.
///
/// ```text
/// GET|POST /zones
/// PUT      /zones/{id}     rename
/// GET|POST /sites          (?zone_id=)
/// PUT      /sites/{id}     rename
/// GET|POST /categories
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/zones", get(catalog::list_zones).post(catalog::create_zone))
        .route("/zones/{id}", put(catalog::rename_zone))
        .route("/sites", get(catalog::list_sites).post(catalog::create_site))
        .route("/sites/{id}", put(catalog::rename_site))
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
}
