use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gemellifix_ai::{DisabledGateway, HttpGateway, HttpGatewayConfig, PromptGateway};
use gemellifix_api::auth::password::hash_password;
use gemellifix_api::config::ServerConfig;
use gemellifix_api::notifications::NotificationRouter;
use gemellifix_api::router::build_app_router;
use gemellifix_api::state::AppState;
use gemellifix_api::storage::LocalBlobStore;
use gemellifix_api::ws;
use gemellifix_core::roles::Role;
use gemellifix_db::models::user::CreateUser;
use gemellifix_db::repositories::UserRepo;
use gemellifix_db::DbPool;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemellifix_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gemellifix_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    gemellifix_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    gemellifix_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    bootstrap_admin(&pool, &config).await;

    // --- AI gateway ---
    let ai: Arc<dyn PromptGateway> = match &config.ai.api_key {
        Some(api_key) => Arc::new(
            HttpGateway::new(HttpGatewayConfig {
                api_key: api_key.clone(),
                model: config.ai.model.clone(),
                base_url: config.ai.base_url.clone(),
                timeout: config.ai.timeout,
            })
            .expect("Failed to build AI HTTP client"),
        ),
        None => {
            tracing::warn!("AI_API_KEY not set, AI endpoints will answer 502");
            Arc::new(DisabledGateway)
        }
    };

    // --- Blob storage ---
    let blobs = Arc::new(LocalBlobStore::new(
        config.storage.root.clone(),
        config.storage.public_url.clone(),
    ));
    tracing::info!(root = %config.storage.root.display(), "Local blob store ready");

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), heartbeat_cancel.clone());

    // --- Event bus ---
    let event_bus = Arc::new(gemellifix_events::EventBus::default());

    let notification_router = NotificationRouter::new(pool.clone(), Arc::clone(&ws_manager));
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));
    let feed_handle = tokio::spawn(ws::run_change_feed(
        Arc::clone(&ws_manager),
        event_bus.subscribe(),
    ));
    tracing::info!("Event services started (notification router, change feed)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        ai,
        blobs,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The handlers' clones of the bus went with the router; dropping ours
    // closes the channel and ends both subscribers.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), feed_handle).await;
    tracing::info!("Event services shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), heartbeat_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Create the configured first administrator when no account exists yet.
async fn bootstrap_admin(pool: &DbPool, config: &ServerConfig) {
    let Some(admin) = &config.bootstrap_admin else {
        return;
    };
    let existing = UserRepo::count(pool)
        .await
        .expect("Failed to count users");
    if existing > 0 {
        return;
    }

    let password_hash =
        hash_password(&admin.password).expect("Failed to hash bootstrap admin password");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: "Administrador".into(),
            email: admin.email.trim().to_lowercase(),
            avatar: None,
            role: Role::Admin,
            password_hash,
        },
    )
    .await
    .expect("Failed to create bootstrap admin");
    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap administrator created");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
