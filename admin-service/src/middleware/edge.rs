//! Cheap perimeter check for browser-facing pages.
//!
//! Only inspects the session cookie's shape; it never touches the session
//! store. Requests with a missing or malformed cookie are bounced to the
//! login page with the original destination preserved in `next`. Full
//! validation happens later in [`super::auth_middleware`].

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::services::check_token_format;
use crate::AppState;

/// Path prefixes that require a well-formed session cookie to pass.
const PROTECTED_PREFIXES: &[&str] = &["/admin", "/dashboard"];

/// Returns true when the path belongs to the protected browser surface.
pub fn is_protected_path(path: &str) -> bool {
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

pub async fn edge_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: axum::middleware::Next,
) -> Response {
    let path = req.uri().path().to_string();

    if !is_protected_path(&path) {
        return next.run(req).await;
    }

    let token_ok = jar
        .get(&state.config.session.cookie_name)
        .map(|cookie| check_token_format(cookie.value()).is_ok())
        .unwrap_or(false);

    if token_ok {
        return next.run(req).await;
    }

    let destination = match req.uri().query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    tracing::debug!(path = %destination, "Redirecting unauthenticated request to login");

    let location = format!(
        "{}?next={}",
        state.config.security.login_path,
        urlencoding::encode(&destination)
    );

    Redirect::to(&location).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_path_classification() {
        assert!(is_protected_path("/admin"));
        assert!(is_protected_path("/admin/calendar/events"));
        assert!(is_protected_path("/dashboard"));
        assert!(!is_protected_path("/administrator"));
        assert!(!is_protected_path("/health"));
        assert!(!is_protected_path("/login"));
        assert!(!is_protected_path("/auth/login"));
        assert!(!is_protected_path("/"));
    }
}
