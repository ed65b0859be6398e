//! Session sweep and sliding-activity behavior, exercised directly against
//! the session service with an in-memory store.

mod common;

use admin_service::models::{AccessScope, Session, UserType};
use admin_service::services::{
    MemoryDirectoryStore, MemorySessionStore, SessionError, SessionPolicy, SessionService,
    SessionStore,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

fn service_with_policy(
    policy: SessionPolicy,
) -> (SessionService, Arc<MemorySessionStore>, Arc<MemoryDirectoryStore>) {
    let sessions = Arc::new(MemorySessionStore::new());
    let directory = Arc::new(MemoryDirectoryStore::new());
    let service = SessionService::new(sessions.clone(), directory.clone(), policy);
    (service, sessions, directory)
}

fn service() -> (SessionService, Arc<MemorySessionStore>, Arc<MemoryDirectoryStore>) {
    service_with_policy(SessionPolicy::default())
}

fn seed_active_user(directory: &MemoryDirectoryStore) -> Uuid {
    let user = admin_service::models::User::new(
        format!("{}@campus.test", Uuid::new_v4()),
        None,
        UserType::SystemAdmin,
        AccessScope::All,
        None,
        "unused-hash".to_string(),
    );
    let user_id = user.user_id;
    directory.seed_user(user);
    user_id
}

fn expired_session(user_id: Uuid) -> Session {
    let mut session = Session::new(user_id, 24);
    session.expiry_utc = Utc::now() - Duration::hours(1);
    session
}

fn idle_session(user_id: Uuid, idle_days: i64) -> Session {
    let mut session = Session::new(user_id, 24 * 365);
    session.updated_utc = Utc::now() - Duration::days(idle_days);
    session
}

#[tokio::test]
async fn expired_sweep_removes_only_expired_sessions() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);

    sessions.seed(expired_session(user_id));
    sessions.seed(expired_session(user_id));
    let live = Session::new(user_id, 24);
    sessions.seed(live.clone());

    let deleted = service.cleanup_expired().await.unwrap();
    assert_eq!(deleted, 2);

    assert!(sessions.find_session(live.session_id).await.unwrap().is_some());
}

#[tokio::test]
async fn inactive_sweep_skips_already_expired_sessions() {
    let policy = SessionPolicy {
        inactive_threshold_days: 30,
        ..SessionPolicy::default()
    };
    let (service, sessions, directory) = service_with_policy(policy);
    let user_id = seed_active_user(&directory);

    // Idle but unexpired: swept.
    sessions.seed(idle_session(user_id, 45));
    // Idle AND expired: left for the expired sweep.
    let mut idle_and_expired = idle_session(user_id, 45);
    idle_and_expired.expiry_utc = Utc::now() - Duration::hours(1);
    sessions.seed(idle_and_expired.clone());
    // Recently active: kept.
    let fresh = Session::new(user_id, 24);
    sessions.seed(fresh.clone());

    let deleted = service.cleanup_inactive().await.unwrap();
    assert_eq!(deleted, 1);

    assert!(sessions
        .find_session(idle_and_expired.session_id)
        .await
        .unwrap()
        .is_some());
    assert!(sessions.find_session(fresh.session_id).await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_sweep_keeps_most_recently_updated_session_per_user() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);
    let other_user = seed_active_user(&directory);

    let mut older = Session::new(user_id, 24);
    older.updated_utc = Utc::now() - Duration::hours(3);
    let mut middle = Session::new(user_id, 24);
    middle.updated_utc = Utc::now() - Duration::hours(2);
    let newest = Session::new(user_id, 24);
    let other = Session::new(other_user, 24);

    sessions.seed(older.clone());
    sessions.seed(middle.clone());
    sessions.seed(newest.clone());
    sessions.seed(other.clone());

    let deleted = service.cleanup_duplicates().await.unwrap();
    assert_eq!(deleted, 2);

    assert!(sessions.find_session(newest.session_id).await.unwrap().is_some());
    assert!(sessions.find_session(other.session_id).await.unwrap().is_some());
    assert!(sessions.find_session(older.session_id).await.unwrap().is_none());
    assert!(sessions.find_session(middle.session_id).await.unwrap().is_none());
}

#[tokio::test]
async fn sweeps_are_idempotent() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);

    sessions.seed(expired_session(user_id));
    sessions.seed(Session::new(user_id, 24));
    sessions.seed(Session::new(user_id, 24));

    let first = service.cleanup_all().await.unwrap();
    assert!(first.total() > 0);

    let second = service.cleanup_all().await.unwrap();
    assert_eq!(second.total(), 0);
}

#[tokio::test]
async fn full_sweep_reports_per_phase_counts() {
    let policy = SessionPolicy {
        inactive_threshold_days: 30,
        ..SessionPolicy::default()
    };
    let (service, sessions, directory) = service_with_policy(policy);
    let user_a = seed_active_user(&directory);
    let user_b = seed_active_user(&directory);

    sessions.seed(expired_session(user_a));
    sessions.seed(idle_session(user_a, 60));
    sessions.seed(Session::new(user_b, 24));
    sessions.seed(Session::new(user_b, 24));

    let report = service.cleanup_all().await.unwrap();
    assert_eq!(report.expired_deleted, 1);
    assert_eq!(report.inactive_deleted, 1);
    assert_eq!(report.duplicate_deleted, 1);
    assert_eq!(report.total(), 3);
}

#[tokio::test]
async fn validation_distinguishes_missing_from_expired() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);

    let unknown = Uuid::new_v4().to_string();
    assert!(matches!(
        service.validate(&unknown).await,
        Err(SessionError::NotFound)
    ));

    let expired = expired_session(user_id);
    let token = expired.session_id.to_string();
    sessions.seed(expired);
    assert!(matches!(
        service.validate(&token).await,
        Err(SessionError::Expired)
    ));

    // Once swept, the same token downgrades from Expired to NotFound.
    service.cleanup_expired().await.unwrap();
    assert!(matches!(
        service.validate(&token).await,
        Err(SessionError::NotFound)
    ));
}

#[tokio::test]
async fn malformed_token_never_reaches_the_store() {
    let (service, sessions, _directory) = service();

    let result = service.validate("definitely-not-a-uuid").await;
    assert!(matches!(result, Err(SessionError::MalformedToken)));
    assert_eq!(sessions.lookup_count(), 0);
}

#[tokio::test]
async fn sliding_activity_refreshes_updated_utc() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);

    let mut session = Session::new(user_id, 24);
    session.updated_utc = Utc::now() - Duration::hours(5);
    let token = session.session_id.to_string();
    let session_id = session.session_id;
    sessions.seed(session);

    let before = Utc::now() - Duration::seconds(1);
    service.validate(&token).await.unwrap();

    let stored = sessions.find_session(session_id).await.unwrap().unwrap();
    assert!(stored.updated_utc > before);
}

#[tokio::test]
async fn sliding_activity_off_leaves_updated_utc_alone() {
    let policy = SessionPolicy {
        sliding_activity: false,
        ..SessionPolicy::default()
    };
    let (service, sessions, directory) = service_with_policy(policy);
    let user_id = seed_active_user(&directory);

    let mut session = Session::new(user_id, 24);
    let stale = Utc::now() - Duration::hours(5);
    session.updated_utc = stale;
    let token = session.session_id.to_string();
    let session_id = session.session_id;
    sessions.seed(session);

    service.validate(&token).await.unwrap();

    let stored = sessions.find_session(session_id).await.unwrap().unwrap();
    assert_eq!(stored.updated_utc, stale);
}

#[tokio::test]
async fn metrics_partition_active_and_expired() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);

    sessions.seed(expired_session(user_id));
    sessions.seed(Session::new(user_id, 24));
    sessions.seed(Session::new(user_id, 24));

    let metrics = service.session_metrics().await.unwrap();
    assert_eq!(metrics.total_sessions, 3);
    assert_eq!(metrics.active_sessions, 2);
    assert_eq!(metrics.expired_sessions, 1);
    assert_eq!(metrics.users_with_sessions, 1);
    assert_eq!(metrics.most_sessions_per_user, 3);
}

#[tokio::test]
async fn store_failure_surfaces_as_store_error() {
    let (service, sessions, directory) = service();
    let user_id = seed_active_user(&directory);
    let session = Session::new(user_id, 24);
    let token = session.session_id.to_string();
    sessions.seed(session);

    sessions.set_failing(true);

    assert!(matches!(
        service.validate(&token).await,
        Err(SessionError::Store(_))
    ));
    assert!(matches!(
        service.cleanup_all().await,
        Err(SessionError::Store(_))
    ));
}
