//! One-shot session sweep, intended for a cron or scheduled job runner.
//!
//! Runs the expired, inactive, and duplicate sweeps in order and exits
//! non-zero if any sweep fails, so the scheduler can alert on it.

use admin_service::{
    config::AdminConfig,
    services::{Database, SessionPolicy, SessionService},
};
use platform_core::observability::logging::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    init_tracing("session-sweep", &config.log_level);

    let pool = match admin_service::db::create_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            return std::process::ExitCode::FAILURE;
        }
    };

    let database = Arc::new(Database::new(pool));
    let policy = SessionPolicy {
        session_hours: config.session.expiry_hours,
        inactive_threshold_days: config.session.inactive_threshold_days,
        sliding_activity: config.session.sliding_activity,
    };
    let service = SessionService::new(database.clone(), database.clone(), policy);

    let before = match service.session_metrics().await {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read session metrics");
            return std::process::ExitCode::FAILURE;
        }
    };
    tracing::info!(
        total = before.total_sessions,
        active = before.active_sessions,
        expired = before.expired_sessions,
        "Session store before sweep"
    );

    let report = match service.cleanup_all().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Session sweep failed");
            return std::process::ExitCode::FAILURE;
        }
    };

    match service.session_metrics().await {
        Ok(after) => {
            tracing::info!(
                expired_deleted = report.expired_deleted,
                inactive_deleted = report.inactive_deleted,
                duplicate_deleted = report.duplicate_deleted,
                total_deleted = report.total(),
                remaining = after.total_sessions,
                "Session sweep finished"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sweep succeeded but post-sweep metrics failed");
        }
    }

    std::process::ExitCode::SUCCESS
}
