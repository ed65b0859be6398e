use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{middleware::Authenticated, models::SessionMetrics, AppState};
use platform_core::error::AppError;

fn require_system_level(context: &crate::services::AuthzContext) -> Result<(), AppError> {
    if !context.user_type.is_system_level() {
        return Err(AppError::Forbidden(anyhow::anyhow!("Not permitted")));
    }
    Ok(())
}

/// Session store statistics
#[utoipa::path(
    get,
    path = "/admin/sessions/metrics",
    responses(
        (status = 200, description = "Current session metrics", body = SessionMetrics),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Administration"
)]
pub async fn session_metrics(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
) -> Result<impl IntoResponse, AppError> {
    require_system_level(&context)?;

    let metrics = state.session_service.session_metrics().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to collect session metrics");
        AppError::InternalError(anyhow::anyhow!("Failed to collect metrics"))
    })?;

    Ok((StatusCode::OK, Json(metrics)))
}

/// Run all session sweeps immediately
#[utoipa::path(
    post,
    path = "/admin/sessions/cleanup",
    responses(
        (status = 200, description = "Sweep report", body = SweepReport),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Administration"
)]
pub async fn cleanup_sessions(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
) -> Result<impl IntoResponse, AppError> {
    require_system_level(&context)?;

    tracing::info!(user_id = %context.user_id, "Manual session cleanup requested");

    let report = state.session_service.cleanup_all().await.map_err(|e| {
        tracing::error!(error = %e, "Session cleanup failed");
        AppError::InternalError(anyhow::anyhow!("Session cleanup failed"))
    })?;

    Ok((StatusCode::OK, Json(report)))
}
