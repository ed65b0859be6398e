use admin_service::{
    build_router,
    config::AdminConfig,
    services::{AuditService, AuthzGate, Database, SessionPolicy, SessionService},
    AppState,
};
use platform_core::middleware::rate_limit::create_ip_rate_limiter;
use platform_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), platform_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = AdminConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting admin service"
    );

    // Initialize database
    let pool = admin_service::db::create_pool(&config.database).await?;
    admin_service::db::run_migrations(&pool).await.map_err(|e| {
        platform_core::error::AppError::InternalError(anyhow::anyhow!(
            "Migration failed: {}",
            e
        ))
    })?;
    let database = Arc::new(Database::new(pool));

    // Initialize rate limiters
    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Login and Global IP");

    // Initialize services
    let policy = SessionPolicy {
        session_hours: config.session.expiry_hours,
        inactive_threshold_days: config.session.inactive_threshold_days,
        sliding_activity: config.session.sliding_activity,
    };
    let session_service =
        SessionService::new(database.clone(), database.clone(), policy);
    let authz = AuthzGate::new(session_service.clone(), database.clone());
    let audit = AuditService::new(database.clone());

    let state = AppState {
        config: config.clone(),
        sessions: database.clone(),
        directory: database.clone(),
        calendar: database.clone(),
        session_service,
        authz,
        audit,
        login_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
