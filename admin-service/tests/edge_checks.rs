//! Perimeter behavior: format-only cookie checks and the login redirect.

mod common;

use admin_service::models::{AccessScope, UserType};
use common::TestApp;
use reqwest::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn protected_path_without_cookie_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/admin/calendar/events"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("Redirect must carry a Location header");
    assert_eq!(location, "/login?next=%2Fadmin%2Fcalendar%2Fevents");
}

#[tokio::test]
async fn redirect_preserves_the_query_string() {
    let app = TestApp::spawn().await;
    let campus = Uuid::new_v4();

    let response = app
        .client
        .get(app.url(&format!("/admin/calendar/events?campus_id={}", campus)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    let expected = format!(
        "/login?next={}",
        urlencoding::encode(&format!("/admin/calendar/events?campus_id={}", campus))
    );
    assert_eq!(location, expected);
}

#[tokio::test]
async fn malformed_cookie_is_bounced_without_a_store_lookup() {
    let app = TestApp::spawn().await;

    let response = app
        .with_cookie(
            app.client.get(app.url("/admin/calendar/events")),
            "not-a-uuid-at-all",
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.sessions.lookup_count(), 0);
}

#[tokio::test]
async fn well_formed_but_unknown_cookie_passes_the_edge_then_fails_the_gate() {
    let app = TestApp::spawn().await;

    let response = app
        .with_cookie(
            app.client.get(app.url("/admin/calendar/events")),
            &Uuid::new_v4().to_string(),
        )
        .send()
        .await
        .unwrap();

    // The edge only checks shape; the gate does the real lookup.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.sessions.lookup_count(), 1);
}

#[tokio::test]
async fn unprotected_paths_skip_the_edge_entirely() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn valid_cookie_passes_the_edge_and_the_gate() {
    let app = TestApp::spawn().await;
    app.seed_user(
        "root@campus.test",
        UserType::SystemAdmin,
        AccessScope::All,
        None,
    );
    app.login("root@campus.test").await;

    let response = app
        .client
        .get(app.url("/admin/calendar/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
