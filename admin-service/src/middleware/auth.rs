//! Full session validation for API routes.
//!
//! Resolves the session cookie against the session store, loads the user,
//! and stashes the resulting [`AuthzContext`] in request extensions so
//! handlers can make per-action decisions without a second lookup.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::dtos::ErrorResponse;
use crate::services::{AuthzContext, AuthzError};
use crate::AppState;
use platform_core::error::AppError;

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_default();

    let context = state
        .authz
        .resolve(&token)
        .await
        .map_err(|e: AuthzError| AppError::from(e))?;

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Extractor for the authenticated caller's context.
///
/// Only valid on routes behind [`auth_middleware`].
pub struct Authenticated(pub AuthzContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts.extensions.get::<AuthzContext>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Authorization context missing from request extensions".to_string(),
            }),
        ))?;

        Ok(Authenticated(context.clone()))
    }
}
