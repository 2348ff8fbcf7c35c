//! Ticket lifecycle over HTTP: creation, visibility, assignment, status
//! changes, evidence and approval.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get_auth, post_json_auth, post_multipart_auth, put_json_auth,
    seed_catalog, token_for, Catalog,
};
use gemellifix_core::roles::Role;
use gemellifix_db::models::user::User;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Cast {
    admin: User,
    requester: User,
    technician: User,
    catalog: Catalog,
}

async fn cast(pool: &PgPool) -> Cast {
    Cast {
        admin: create_user(pool, "Admin", Role::Admin).await,
        requester: create_user(pool, "Ana Docente", Role::Teacher).await,
        technician: create_user(pool, "Tomas Tecnico", Role::GeneralServices).await,
        catalog: seed_catalog(pool).await,
    }
}

async fn create_ticket(app: axum::Router, cast: &Cast, priority: &str) -> Value {
    let response = post_json_auth(
        app,
        "/api/v1/tickets",
        &token_for(&cast.requester),
        json!({
            "title": "Fuga en el lavamanos",
            "description": "El lavamanos del baño gotea constantemente",
            "category": cast.catalog.category.name,
            "zone_id": cast.catalog.zone.id,
            "site_id": cast.catalog.site.id,
            "priority": priority,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn assign(app: axum::Router, cast: &Cast, ticket_id: i64) -> Value {
    let response = put_json_auth(
        app,
        &format!("/api/v1/tickets/{ticket_id}/assignees"),
        &token_for(&cast.admin),
        json!({ "assignee_ids": [cast.technician.id] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn transition(
    app: axum::Router,
    user: &User,
    ticket_id: i64,
    status: &str,
    comment: Option<&str>,
) -> axum::http::Response<axum::body::Body> {
    post_json_auth(
        app,
        &format!("/api/v1/tickets/{ticket_id}/transition"),
        &token_for(user),
        json!({ "status": status, "comment": comment }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Creation and visibility
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_ticket_fills_code_names_and_due_date(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);

    let ticket = create_ticket(app, &cast, "Alta").await;

    assert_eq!(ticket["status"], "Abierto");
    assert_eq!(ticket["priority"], "Alta");
    assert_eq!(ticket["zone"], "Bloque A");
    assert_eq!(ticket["site"], "Baño 2");
    assert_eq!(ticket["category"], "Plomería");
    assert_eq!(ticket["requester_id"], cast.requester.id);
    assert_eq!(ticket["requester_name"], "Ana Docente");
    assert!(ticket["code"].as_str().unwrap().starts_with("GEMMAN-BLOQ-BAÑO-"));
    assert!(ticket["due_date"].is_string());
    assert_eq!(ticket["assignee_ids"], json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sst_cannot_create_tickets(pool: PgPool) {
    let cast = cast(&pool).await;
    let sst = create_user(&pool, "Seguridad", Role::Sst).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/tickets",
        &token_for(&sst),
        json!({
            "title": "Revisión",
            "category": cast.catalog.category.name,
            "zone_id": cast.catalog.zone.id,
            "site_id": cast.catalog.site.id,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn site_from_another_zone_is_rejected(pool: PgPool) {
    let cast = cast(&pool).await;
    let other_zone = gemellifix_db::repositories::ZoneRepo::create(&pool, "Bloque B")
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/tickets",
        &token_for(&cast.requester),
        json!({
            "title": "Luz dañada",
            "category": cast.catalog.category.name,
            "zone_id": other_zone.id,
            "site_id": cast.catalog.site.id,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn requesters_only_see_their_own_tickets(pool: PgPool) {
    let cast = cast(&pool).await;
    let stranger = create_user(&pool, "Otra Docente", Role::Teacher).await;
    let app = common::build_test_app(pool);

    let ticket = create_ticket(app.clone(), &cast, "Media").await;
    let id = ticket["id"].as_i64().unwrap();

    let own = body_json(get_auth(app.clone(), "/api/v1/tickets", &token_for(&cast.requester)).await).await;
    assert_eq!(own["data"].as_array().unwrap().len(), 1);

    let other = body_json(get_auth(app.clone(), "/api/v1/tickets", &token_for(&stranger)).await).await;
    assert!(other["data"].as_array().unwrap().is_empty());

    let all = body_json(get_auth(app.clone(), "/api/v1/tickets", &token_for(&cast.admin)).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 1);

    let forbidden = get_auth(app, &format!("/api/v1/tickets/{id}"), &token_for(&stranger)).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_rejects_unknown_status_filter(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/tickets?status=Perdido", &token_for(&cast.admin)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Assignment and status changes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn assigning_a_technician_moves_ticket_to_assigned(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;

    let assigned = assign(app.clone(), &cast, ticket["id"].as_i64().unwrap()).await;

    assert_eq!(assigned["status"], "Asignado");
    assert_eq!(assigned["assignee_ids"], json!([cast.technician.id]));
    assert_eq!(assigned["assignee_names"], json!(["Tomas Tecnico"]));

    let visible = body_json(get_auth(app, "/api/v1/tickets", &token_for(&cast.technician)).await).await;
    assert_eq!(visible["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_general_services_can_be_assigned(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;

    let response = put_json_auth(
        app,
        &format!("/api/v1/tickets/{}/assignees", ticket["id"]),
        &token_for(&cast.admin),
        json!({ "assignee_ids": [cast.requester.id] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn technician_progress_requires_comment(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;
    let id = ticket["id"].as_i64().unwrap();
    assign(app.clone(), &cast, id).await;

    let started = transition(app.clone(), &cast.technician, id, "En Progreso", None).await;
    assert_eq!(started.status(), StatusCode::OK);

    let silent = transition(app.clone(), &cast.technician, id, "Resuelto", None).await;
    assert_eq!(silent.status(), StatusCode::BAD_REQUEST);

    let resolved = transition(
        app.clone(),
        &cast.technician,
        id,
        "Resuelto",
        Some("Se cambió el empaque"),
    )
    .await;
    assert_eq!(resolved.status(), StatusCode::OK);
    let json = body_json(resolved).await;
    assert_eq!(json["data"]["status"], "Resuelto");
    assert!(json["data"]["resolved_at"].is_string());

    let logs = body_json(
        get_auth(app, &format!("/api/v1/tickets/{id}/logs"), &token_for(&cast.admin)).await,
    )
    .await;
    let actions: Vec<&str> = logs["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["action"].as_str().unwrap())
        .collect();
    assert!(actions.contains(&"create_ticket"));
    assert!(actions.contains(&"update_assignment"));
    assert!(actions.contains(&"add_comment"));
    assert_eq!(actions.iter().filter(|a| **a == "update_status").count(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_transition_is_409(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;

    let response = transition(
        app,
        &cast.admin,
        ticket["id"].as_i64().unwrap(),
        "Cerrado",
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_TRANSITION");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn requester_cannot_move_ticket_forward(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;
    let id = ticket["id"].as_i64().unwrap();
    assign(app.clone(), &cast, id).await;

    let response = transition(app, &cast.requester, id, "En Progreso", Some("ya")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Evidence and approval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn evidence_then_approval_closes_ticket(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Urgente").await;
    let id = ticket["id"].as_i64().unwrap();
    assign(app.clone(), &cast, id).await;

    let evidence = post_multipart_auth(
        app.clone(),
        &format!("/api/v1/tickets/{id}/evidence"),
        &token_for(&cast.technician),
        ("arreglo final.png", "image/png", b"\x89PNG fake bytes"),
        &[("comment", "Trabajo terminado")],
    )
    .await;
    assert_eq!(evidence.status(), StatusCode::OK);
    let json = body_json(evidence).await;
    assert_eq!(json["data"]["status"], "Requiere Aprobación");
    let files = json["data"]["evidence"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0]["url"]
        .as_str()
        .unwrap()
        .starts_with(&format!("/files/ticket-evidence/{id}/")));

    let approved = post_json_auth(
        app,
        &format!("/api/v1/tickets/{id}/approve"),
        &token_for(&cast.requester),
        json!({}),
    )
    .await;
    assert_eq!(approved.status(), StatusCode::OK);
    let json = body_json(approved).await;
    assert_eq!(json["data"]["status"], "Cerrado");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejection_sends_ticket_back_to_assigned(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;
    let id = ticket["id"].as_i64().unwrap();
    assign(app.clone(), &cast, id).await;
    let awaiting = transition(app.clone(), &cast.technician, id, "Requiere Aprobación", None).await;
    assert_eq!(awaiting.status(), StatusCode::OK);

    let rejected = post_json_auth(
        app,
        &format!("/api/v1/tickets/{id}/reject"),
        &token_for(&cast.requester),
        json!({ "comment": "Sigue goteando" }),
    )
    .await;

    assert_eq!(rejected.status(), StatusCode::OK);
    let json = body_json(rejected).await;
    assert_eq!(json["data"]["status"], "Asignado");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approve_requires_pending_approval(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;

    let response = post_json_auth(
        app,
        &format!("/api/v1/tickets/{}/approve", ticket["id"]),
        &token_for(&cast.requester),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unsupported_upload_type_is_400(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;

    let response = post_multipart_auth(
        app,
        &format!("/api/v1/tickets/{}/attachments", ticket["id"]),
        &token_for(&cast.requester),
        ("script.sh", "text/x-shellscript", b"echo hi"),
        &[],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Admin edits and advice
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn priority_change_recomputes_due_date(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Baja").await;
    let id = ticket["id"].as_i64().unwrap();

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/tickets/{id}/priority"),
        &token_for(&cast.admin),
        json!({ "priority": "Urgente" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["priority"], "Urgente");
    assert_ne!(json["data"]["due_date"], ticket["due_date"]);

    let requester_try = put_json_auth(
        app,
        &format!("/api/v1/tickets/{id}/priority"),
        &token_for(&cast.requester),
        json!({ "priority": "Alta" }),
    )
    .await;
    assert_eq!(requester_try.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn advice_suggests_next_status(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool);
    let ticket = create_ticket(app.clone(), &cast, "Media").await;

    let response = get_auth(
        app,
        &format!("/api/v1/tickets/{}/advice", ticket["id"]),
        &token_for(&cast.requester),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "Abierto");
    assert_eq!(json["data"]["overdue"], false);
    assert_eq!(json["data"]["suggested_status"], "Asignado");
    assert_eq!(json["data"]["is_actionable"], true);
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn status_change_succeeds_when_audit_log_rejects_writes(pool: PgPool) {
    let cast = cast(&pool).await;
    let app = common::build_test_app(pool.clone());
    let ticket = create_ticket(app.clone(), &cast, "Alta").await;
    let id = ticket["id"].as_i64().unwrap();
    assign(app.clone(), &cast, id).await;

    let logged_before: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    // Existing rows stay; every new insert fails the check.
    sqlx::query("ALTER TABLE logs ADD CONSTRAINT ck_logs_closed CHECK (false) NOT VALID")
        .execute(&pool)
        .await
        .unwrap();

    let response = transition(app, &cast.technician, id, "En Progreso", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "En Progreso");

    let stored: String = sqlx::query_scalar("SELECT status FROM tickets WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, "En Progreso");
    let logged_after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(logged_after, logged_before);
}
