//! Test helpers for admin-service integration tests.
//!
//! Spawns the real router on a random port with in-memory stores, so the
//! full HTTP surface (cookies, middleware, handlers) is exercised without
//! PostgreSQL.

#![allow(dead_code)]

use admin_service::{
    build_router,
    config::{
        AdminConfig, DatabaseConfig, Environment, RateLimitConfig, SecurityConfig, SessionConfig,
        SwaggerConfig, SwaggerMode,
    },
    models::{AccessScope, Campus, Session, User, UserType},
    services::{
        AuditService, AuthzGate, MemoryAuditStore, MemoryCalendarStore, MemoryDirectoryStore,
        MemorySessionStore, SessionPolicy, SessionService,
    },
    utils::{hash_password, Password},
    AppState,
};
use platform_core::middleware::rate_limit::create_ip_rate_limiter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "campus-Pass-42";
pub const COOKIE_NAME: &str = "campus_session";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub sessions: Arc<MemorySessionStore>,
    pub directory: Arc<MemoryDirectoryStore>,
    pub audit_store: Arc<MemoryAuditStore>,
    pub calendar: Arc<MemoryCalendarStore>,
}

impl TestApp {
    /// Spawn with the default session policy.
    pub async fn spawn() -> Self {
        Self::spawn_with_policy(SessionPolicy::default()).await
    }

    /// Spawn with an explicit session policy.
    pub async fn spawn_with_policy(policy: SessionPolicy) -> Self {
        let sessions = Arc::new(MemorySessionStore::new());
        let directory = Arc::new(MemoryDirectoryStore::new());
        let audit_store = Arc::new(MemoryAuditStore::new());
        let calendar = Arc::new(MemoryCalendarStore::new());

        let config = test_config(&policy);

        let session_service = SessionService::new(sessions.clone(), directory.clone(), policy);
        let authz = AuthzGate::new(session_service.clone(), directory.clone());
        let audit = AuditService::new(audit_store.clone());

        let state = AppState {
            config,
            sessions: sessions.clone(),
            directory: directory.clone(),
            calendar: calendar.clone(),
            session_service,
            authz,
            audit,
            login_rate_limiter: create_ip_rate_limiter(1000, 60),
            ip_rate_limiter: create_ip_rate_limiter(10_000, 60),
        };

        let app = build_router(state.clone())
            .await
            .expect("Failed to build router");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Wait for the server to accept connections
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build reqwest client");

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            client,
            state,
            sessions,
            directory,
            audit_store,
            calendar,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Register a campus in the directory and return its id.
    pub fn seed_campus(&self) -> Uuid {
        let campus_id = Uuid::new_v4();
        self.directory.seed_campus(Campus {
            campus_id,
            institution_id: Uuid::new_v4(),
            name: "Test Campus".to_string(),
            created_utc: chrono::Utc::now(),
        });
        campus_id
    }

    /// Seed an active user with the shared test password.
    pub fn seed_user(
        &self,
        email: &str,
        user_type: UserType,
        access_scope: AccessScope,
        primary_campus_id: Option<Uuid>,
    ) -> User {
        let hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
            .expect("Failed to hash test password");
        let user = User::new(
            email.to_string(),
            Some("Test User".to_string()),
            user_type,
            access_scope,
            primary_campus_id,
            hash.into_string(),
        );
        self.directory.seed_user(user.clone());
        user
    }

    /// Log in through the HTTP surface; the client keeps the cookie.
    pub async fn login(&self, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// Seed a session row directly, bypassing login.
    pub fn seed_session(&self, session: Session) {
        self.sessions.seed(session);
    }

    /// Send a request with an explicit session cookie value.
    pub fn with_cookie(&self, builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::COOKIE,
            format!("{}={}", COOKIE_NAME, token),
        )
    }
}

fn test_config(policy: &SessionPolicy) -> AdminConfig {
    AdminConfig {
        common: platform_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "admin-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: "postgres://localhost/admin_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        session: SessionConfig {
            expiry_hours: policy.session_hours,
            inactive_threshold_days: policy.inactive_threshold_days,
            sliding_activity: policy.sliding_activity,
            cookie_name: COOKIE_NAME.to_string(),
            cookie_secure: false,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            login_path: "/login".to_string(),
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
    }
}
