use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    dtos::auth::{LoginRequest, LoginResponse},
    models::{AuditOutcome, SessionInfo, UserResponse},
    services::{DirectoryStore, SessionError},
    utils::{verify_password, Password, PasswordHashString, ValidatedJson},
    AppState,
};
use platform_core::error::AppError;

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((state.config.session.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .secure(state.config.session.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.config.session.expiry_hours))
        .build()
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, impl IntoResponse), AppError> {
    // One generic rejection for unknown email, wrong password, and inactive
    // account; the precise reason goes to the logs only.
    let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"));

    let user = state
        .directory
        .find_user_by_email(&req.email)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Directory lookup failed during login");
            AppError::ServiceUnavailable(anyhow::anyhow!("Service temporarily unavailable"))
        })?
        .ok_or_else(|| {
            tracing::info!("Login rejected: unknown email");
            invalid()
        })?;

    if !user.is_active() {
        tracing::info!(user_id = %user.user_id, "Login rejected: user inactive");
        return Err(invalid());
    }

    let password = Password::new(req.password);
    let stored_hash = PasswordHashString::new(user.password_hash.clone());
    if verify_password(&password, &stored_hash).is_err() {
        tracing::info!(user_id = %user.user_id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let session = state
        .session_service
        .create_session(user.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create session");
            AppError::ServiceUnavailable(anyhow::anyhow!("Service temporarily unavailable"))
        })?;

    state
        .audit
        .session_event(user.user_id, AuditOutcome::SessionCreated, "/auth/login");

    let jar = jar.add(session_cookie(&state, session.session_id.to_string()));

    let body = LoginResponse {
        user: UserResponse::from(user),
        session: SessionInfo::from(session),
    };

    Ok((jar, (StatusCode::OK, Json(body))))
}

/// Logout and revoke the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, impl IntoResponse), AppError> {
    // Idempotent: a missing, malformed, or already-revoked cookie still
    // produces a 200 and a cleared cookie.
    if let Some(cookie) = jar.get(&state.config.session.cookie_name) {
        match state.session_service.revoke_token(cookie.value()).await {
            Ok(Some(user_id)) => {
                state
                    .audit
                    .session_event(user_id, AuditOutcome::SessionRevoked, "/auth/logout");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Failed to revoke session");
                return Err(AppError::ServiceUnavailable(anyhow::anyhow!(
                    "Service temporarily unavailable"
                )));
            }
        }
    }

    let removal = Cookie::build((state.config.session.cookie_name.clone(), ""))
        .path("/")
        .build();
    let jar = jar.remove(removal);

    Ok((
        jar,
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Logged out successfully"
            })),
        ),
    ))
}

/// Introspect the current session
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is valid", body = SessionInfo),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn session_info(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default();

    let validated = state
        .session_service
        .validate(&token)
        .await
        .map_err(|e| match e {
            SessionError::Store(ref inner) => {
                tracing::error!(error = %inner, "Session store failure during introspection");
                AppError::Unauthorized(anyhow::anyhow!("Authentication required"))
            }
            other => {
                tracing::debug!(reason = other.reason_code(), "Session introspection rejected");
                AppError::Unauthorized(anyhow::anyhow!("Authentication required"))
            }
        })?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "session": SessionInfo::from(validated.session),
            "user": UserResponse::from(validated.user),
        })),
    ))
}
