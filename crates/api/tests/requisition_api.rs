//! Purchase requisitions: numbering, status aggregation and the rejection
//! freeze.

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use common::{
    body_json, create_user, delete_auth, get_auth, post_auth, post_json_auth, put_json_auth,
    token_for,
};
use gemellifix_core::roles::Role;
use gemellifix_db::models::requisition::ItemRemoval;
use gemellifix_db::repositories::RequisitionRepo;
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_requisition(app: axum::Router, token: &str, items: Value) -> Value {
    let response = post_json_auth(
        app,
        "/api/v1/requisitions",
        token,
        json!({
            "cost_center": "Mantenimiento",
            "description": "Insumos de plomería",
            "items": items,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn numbers_continue_the_sequence(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);
    let year = Utc::now().year();

    let first = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 2, "product": "Tubo PVC" }]),
    )
    .await;
    let second = create_requisition(
        app,
        &token,
        json!([{ "quantity": 1, "product": "Llave de paso" }]),
    )
    .await;

    assert_eq!(first["number"], format!("REQ-{year}-0001"));
    assert_eq!(second["number"], format!("REQ-{year}-0002"));
    assert_eq!(first["status"], "Pendiente");
    assert_eq!(first["requester_name"], "Admin");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_follows_item_flags(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([
            { "quantity": 2, "product": "Tubo PVC" },
            { "quantity": 1, "product": "Pegante" },
        ]),
    )
    .await;
    let id = req["id"].as_i64().unwrap();
    let items = req["items"].as_array().unwrap();
    let (first, second) = (items[0]["id"].as_i64().unwrap(), items[1]["id"].as_i64().unwrap());

    let partial = put_json_auth(
        app.clone(),
        &format!("/api/v1/requisitions/{id}/items/{first}"),
        &token,
        json!({ "authorized": true }),
    )
    .await;
    assert_eq!(partial.status(), StatusCode::OK);
    assert_eq!(body_json(partial).await["data"]["status"], "Parcialmente Aprobada");

    let approved = put_json_auth(
        app.clone(),
        &format!("/api/v1/requisitions/{id}/items/{second}"),
        &token,
        json!({ "authorized": true }),
    )
    .await;
    let approved = body_json(approved).await;
    assert_eq!(approved["data"]["status"], "Aprobada");
    assert!(approved["data"]["items"][1]["authorized_at"].is_string());

    for item in [first, second] {
        let response = put_json_auth(
            app.clone(),
            &format!("/api/v1/requisitions/{id}/items/{item}"),
            &token,
            json!({ "received": true }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let detail = body_json(get_auth(app, &format!("/api/v1/requisitions/{id}"), &token).await).await;
    assert_eq!(detail["data"]["status"], "Completada");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn receiving_before_authorizing_is_400(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);

    let rejected = post_json_auth(
        app.clone(),
        "/api/v1/requisitions",
        &token,
        json!({ "items": [{ "quantity": 1, "product": "Cemento", "received": true }] }),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 1, "product": "Cemento", "authorized": true, "received": true }]),
    )
    .await;
    let item = req["items"][0]["id"].as_i64().unwrap();

    let unauthorize = put_json_auth(
        app,
        &format!("/api/v1/requisitions/{}/items/{item}", req["id"]),
        &token,
        json!({ "authorized": false }),
    )
    .await;
    assert_eq!(unauthorize.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_item_list_is_400(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/requisitions",
        &token_for(&admin),
        json!({ "items": [] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn items_can_be_added_and_removed_but_not_the_last(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 1, "product": "Bombillo", "authorized": true }]),
    )
    .await;
    let id = req["id"].as_i64().unwrap();
    assert_eq!(req["status"], "Aprobada");

    let added = post_json_auth(
        app.clone(),
        &format!("/api/v1/requisitions/{id}/items"),
        &token,
        json!({ "quantity": 3, "product": "Cinta aislante" }),
    )
    .await;
    assert_eq!(added.status(), StatusCode::CREATED);
    let added = body_json(added).await;
    assert_eq!(added["data"]["status"], "Parcialmente Aprobada");
    let new_item = added["data"]["items"][1]["id"].as_i64().unwrap();
    let original = added["data"]["items"][0]["id"].as_i64().unwrap();

    let removed = delete_auth(
        app.clone(),
        &format!("/api/v1/requisitions/{id}/items/{new_item}"),
        &token,
    )
    .await;
    assert_eq!(removed.status(), StatusCode::OK);
    assert_eq!(body_json(removed).await["data"]["status"], "Aprobada");

    let last = delete_auth(
        app,
        &format!("/api/v1/requisitions/{id}/items/{original}"),
        &token,
    )
    .await;
    assert_eq!(last.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejected_requisition_is_frozen(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool);
    let token = token_for(&admin);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 1, "product": "Pintura" }]),
    )
    .await;
    let id = req["id"].as_i64().unwrap();
    let item = req["items"][0]["id"].as_i64().unwrap();

    let rejected = post_auth(app.clone(), &format!("/api/v1/requisitions/{id}/reject"), &token).await;
    assert_eq!(rejected.status(), StatusCode::OK);
    assert_eq!(body_json(rejected).await["data"]["status"], "Rechazada");

    let edit = put_json_auth(
        app.clone(),
        &format!("/api/v1/requisitions/{id}/items/{item}"),
        &token,
        json!({ "authorized": true }),
    )
    .await;
    assert_eq!(edit.status(), StatusCode::CONFLICT);

    let again = post_auth(app, &format!("/api/v1/requisitions/{id}/reject"), &token).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn status_refresh_keeps_a_rejection(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(&admin);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 2, "product": "Tubo PVC", "authorized": true }]),
    )
    .await;
    let id = req["id"].as_i64().unwrap();
    let rejected = post_auth(app, &format!("/api/v1/requisitions/{id}/reject"), &token).await;
    assert_eq!(rejected.status(), StatusCode::OK);

    let mut conn = pool.acquire().await.unwrap();
    RequisitionRepo::refresh_status(&mut conn, id).await.unwrap();

    let stored = RequisitionRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(stored.status, "Rechazada");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn item_removal_reports_last_and_unknown_items(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(&admin);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 1, "product": "Escoba" }]),
    )
    .await;
    let id = req["id"].as_i64().unwrap();
    let item = req["items"][0]["id"].as_i64().unwrap();

    assert_eq!(
        RequisitionRepo::delete_item(&pool, id, item).await.unwrap(),
        ItemRemoval::LastItem
    );
    assert_eq!(
        RequisitionRepo::delete_item(&pool, id, item + 1000).await.unwrap(),
        ItemRemoval::NotFound
    );

    let missing = delete_auth(
        app,
        &format!("/api/v1/requisitions/{id}/items/{}", item + 1000),
        &token,
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(RequisitionRepo::items(&pool, id).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn item_update_trims_the_product(pool: PgPool) {
    let admin = create_user(&pool, "Admin", Role::Admin).await;
    let app = common::build_test_app(pool.clone());
    let token = token_for(&admin);

    let req = create_requisition(
        app.clone(),
        &token,
        json!([{ "quantity": 1, "product": "Llave" }]),
    )
    .await;
    let id = req["id"].as_i64().unwrap();
    let item = req["items"][0]["id"].as_i64().unwrap();

    let updated = put_json_auth(
        app,
        &format!("/api/v1/requisitions/{id}/items/{item}"),
        &token,
        json!({ "product": "  Llave inglesa  " }),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["data"]["items"][0]["product"], "Llave inglesa");

    let items = RequisitionRepo::items(&pool, id).await.unwrap();
    assert_eq!(items[0].product, "Llave inglesa");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn requisitions_are_admin_only(pool: PgPool) {
    let technician = create_user(&pool, "Tecnico", Role::GeneralServices).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/requisitions", &token_for(&technician)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
