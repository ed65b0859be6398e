//! Session model - opaque-token login sessions.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Persisted session row. The `session_id` doubles as the opaque cookie
/// token, so it never carries any claims of its own.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub expiry_utc: DateTime<Utc>,
}

impl Session {
    /// Create a new session expiring `expiry_hours` from now.
    pub fn new(user_id: Uuid, expiry_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            created_utc: now,
            updated_utc: now,
            expiry_utc: now + Duration::hours(expiry_hours),
        }
    }

    /// A session is live through its exact expiry instant; only
    /// `expiry_utc < now` is expired, matching the sweep predicates.
    pub fn is_expired(&self) -> bool {
        self.expiry_utc < Utc::now()
    }

    /// Idle beyond the inactivity threshold while still unexpired. Such
    /// sessions are hygiene targets for the sweep, not validation failures.
    pub fn is_idle(&self, threshold_days: i64) -> bool {
        !self.is_expired() && self.updated_utc < Utc::now() - Duration::days(threshold_days)
    }
}

/// Session info for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub expiry_utc: DateTime<Utc>,
}

impl From<Session> for SessionInfo {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.session_id,
            created_utc: s.created_utc,
            updated_utc: s.updated_utc,
            expiry_utc: s.expiry_utc,
        }
    }
}

/// Per-phase counts from a full cleanup pass.
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct SweepReport {
    pub expired_deleted: u64,
    pub inactive_deleted: u64,
    pub duplicate_deleted: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.expired_deleted + self.inactive_deleted + self.duplicate_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(updated_ago: Duration, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_utc: now - updated_ago,
            updated_utc: now - updated_ago,
            expiry_utc: now + expires_in,
        }
    }

    #[test]
    fn expiry_in_the_future_is_not_expired() {
        let session = session_at(Duration::zero(), Duration::hours(1));
        assert!(!session.is_expired());
    }

    #[test]
    fn expiry_in_the_past_is_expired() {
        let session = session_at(Duration::zero(), -Duration::seconds(1));
        assert!(session.is_expired());
    }

    #[test]
    fn stale_but_unexpired_session_is_idle() {
        let session = session_at(Duration::days(40), Duration::hours(1));
        assert!(session.is_idle(30));
        assert!(!session.is_expired());
    }

    #[test]
    fn expired_session_is_never_idle() {
        let session = session_at(Duration::days(40), -Duration::hours(1));
        assert!(!session.is_idle(30));
    }

    #[test]
    fn recently_touched_session_is_not_idle() {
        let session = session_at(Duration::days(1), Duration::hours(1));
        assert!(!session.is_idle(30));
    }
}

/// Read-only session store statistics, usable for before/after comparison
/// around a sweep.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SessionMetrics {
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub expired_sessions: u64,
    pub users_with_sessions: u64,
    pub most_sessions_per_user: u64,
    pub oldest_session_age_seconds: i64,
    pub average_session_age_seconds: i64,
}
