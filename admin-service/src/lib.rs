pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use platform_core::middleware::{
    rate_limit::ip_rate_limit_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AdminConfig;
use crate::services::{
    AuditService, AuthzGate, CalendarStore, DirectoryStore, SessionService, SessionStore,
};
use platform_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::session_info,
        handlers::calendar::list_events,
        handlers::calendar::create_event,
        handlers::admin::session_metrics,
        handlers::admin::cleanup_sessions,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::calendar::CreateEventRequest,
            models::AcademicEvent,
            models::SessionInfo,
            models::SessionMetrics,
            models::SweepReport,
            models::UserResponse,
            models::UserType,
            models::AccessScope,
        )
    ),
    tags(
        (name = "Authentication", description = "Session lifecycle: login, logout, introspection"),
        (name = "Calendar", description = "Academic calendar management"),
        (name = "Administration", description = "Session store administration"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AdminConfig,
    pub sessions: Arc<dyn SessionStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub calendar: Arc<dyn CalendarStore>,
    pub session_service: SessionService,
    pub authz: AuthzGate,
    pub audit: AuditService,
    pub login_rate_limiter: platform_core::middleware::rate_limit::IpRateLimiter,
    pub ip_rate_limiter: platform_core::middleware::rate_limit::IpRateLimiter,
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Login gets its own tighter limiter on top of the global one.
    let login_limiter = state.login_rate_limiter.clone();
    let login_route = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(login_limiter, ip_rate_limit_middleware));

    // Everything under /admin runs the full session gate; the edge's
    // format-only check has already bounced the obvious garbage.
    let admin_routes = Router::new()
        .route(
            "/admin/calendar/events",
            get(handlers::calendar::list_events).post(handlers::calendar::create_event),
        )
        .route(
            "/admin/sessions/metrics",
            get(handlers::admin::session_metrics),
        )
        .route(
            "/admin/sessions/cleanup",
            post(handlers::admin::cleanup_sessions),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let ip_limiter = state.ip_rate_limiter.clone();

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        config::Environment::Dev => true,
        config::Environment::Prod => state.config.swagger.enabled == config::SwaggerMode::Public,
    };

    if swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .merge(login_route)
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/session", get(handlers::auth::session_info))
        .merge(admin_routes)
        .layer(from_fn_with_state(state.clone(), middleware::edge_middleware))
        .with_state(state.clone())
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| match o.parse::<HeaderValue>() {
                            Ok(value) => Some(value),
                            Err(e) => {
                                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                                None
                            }
                        })
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.sessions.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Session store health check failed");
        AppError::ServiceUnavailable(anyhow::anyhow!("Session store unavailable"))
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "session_store": "up"
        }
    })))
}
