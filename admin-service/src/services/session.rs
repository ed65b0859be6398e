//! Session validation and lifecycle.
//!
//! Validation distinguishes every failure mode so callers can react
//! differently to "expired" (silent re-login prompt) and "never existed"
//! (worth an audit trail). The lifecycle sweeps are idempotent and safe to
//! run concurrently with live traffic: a session deleted mid-request just
//! makes that request's next validation fail closed.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Session, SessionMetrics, SweepReport, User};
use crate::services::store::{DirectoryStore, SessionStore};

/// Explicit session policy knobs, wired from config.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Session lifetime granted at login.
    pub session_hours: i64,
    /// Idle threshold for the inactive sweep.
    pub inactive_threshold_days: i64,
    /// When true, every successful full validation refreshes `updated_utc`.
    /// One policy, applied everywhere; no per-path inconsistency.
    pub sliding_activity: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            session_hours: 24,
            inactive_threshold_days: 30,
            sliding_activity: true,
        }
    }
}

/// Distinct validation failure modes. Callers must not conflate these.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Malformed session token")]
    MalformedToken,

    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("User is not active")]
    UserInactive,

    #[error("Session store unavailable: {0}")]
    Store(#[source] anyhow::Error),
}

impl SessionError {
    /// Stable code for logs and audit rows.
    pub fn reason_code(&self) -> &'static str {
        match self {
            SessionError::MalformedToken => "malformed_token",
            SessionError::NotFound => "not_found",
            SessionError::Expired => "expired",
            SessionError::UserInactive => "user_inactive",
            SessionError::Store(_) => "store_unavailable",
        }
    }
}

/// A session that passed full validation, with its resolved user.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session: Session,
    pub user: User,
}

/// Cheap format-only token check: 36-character hyphenated UUID. No store
/// access; this is the entirety of what the edge middleware runs.
pub fn check_token_format(token: &str) -> Result<Uuid, SessionError> {
    if token.len() != 36 {
        return Err(SessionError::MalformedToken);
    }
    Uuid::try_parse(token).map_err(|_| SessionError::MalformedToken)
}

#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    directory: Arc<dyn DirectoryStore>,
    policy: SessionPolicy,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        directory: Arc<dyn DirectoryStore>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            sessions,
            directory,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Create a session at login.
    pub async fn create_session(&self, user_id: Uuid) -> Result<Session, SessionError> {
        let session = Session::new(user_id, self.policy.session_hours);
        self.sessions
            .insert_session(&session)
            .await
            .map_err(SessionError::Store)?;
        tracing::info!(
            session_id = %session.session_id,
            user_id = %user_id,
            expiry = %session.expiry_utc,
            "Session created"
        );
        Ok(session)
    }

    /// Revoke a single session (logout).
    pub async fn revoke_session(&self, session_id: Uuid) -> Result<bool, SessionError> {
        let removed = self
            .sessions
            .delete_session(session_id)
            .await
            .map_err(SessionError::Store)?;
        if removed {
            tracing::info!(session_id = %session_id, "Session revoked");
        }
        Ok(removed)
    }

    /// Revoke the session behind a raw token, returning the owning user when
    /// a live row was removed. Malformed tokens and unknown sessions are not
    /// errors here; logout is idempotent.
    pub async fn revoke_token(&self, token: &str) -> Result<Option<Uuid>, SessionError> {
        let session_id = match check_token_format(token) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };

        let session = self
            .sessions
            .find_session(session_id)
            .await
            .map_err(SessionError::Store)?;

        let removed = self
            .sessions
            .delete_session(session_id)
            .await
            .map_err(SessionError::Store)?;

        if removed {
            tracing::info!(session_id = %session_id, "Session revoked");
        }

        Ok(session.filter(|_| removed).map(|s| s.user_id))
    }

    /// Full validation: format, store row, expiry, user state. Used by the
    /// authorization gate; the edge only runs `check_token_format`.
    pub async fn validate(&self, token: &str) -> Result<ValidatedSession, SessionError> {
        let session_id = check_token_format(token)?;

        let session = self
            .sessions
            .find_session(session_id)
            .await
            .map_err(SessionError::Store)?
            .ok_or(SessionError::NotFound)?;

        if session.is_expired() {
            return Err(SessionError::Expired);
        }

        let user = self
            .directory
            .find_user(session.user_id)
            .await
            .map_err(SessionError::Store)?
            .ok_or(SessionError::NotFound)?;

        if !user.is_active() {
            return Err(SessionError::UserInactive);
        }

        let mut session = session;
        if self.policy.sliding_activity {
            let now = Utc::now();
            // Activity refresh is hygiene, not a security boundary; a failed
            // touch must not fail an otherwise valid request.
            if let Err(e) = self.sessions.touch_session(session_id, now).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to refresh session activity");
            } else {
                session.updated_utc = now;
            }
        }

        Ok(ValidatedSession { session, user })
    }

    /// Delete sessions whose expiry is strictly in the past.
    pub async fn cleanup_expired(&self) -> Result<u64, SessionError> {
        let count = self
            .sessions
            .delete_expired(Utc::now())
            .await
            .map_err(SessionError::Store)?;
        tracing::info!(deleted = count, "Expired session sweep complete");
        Ok(count)
    }

    /// Delete unexpired sessions idle past the configured threshold.
    pub async fn cleanup_inactive(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(self.policy.inactive_threshold_days);
        let count = self
            .sessions
            .delete_idle(cutoff, now)
            .await
            .map_err(SessionError::Store)?;
        tracing::info!(
            deleted = count,
            threshold_days = self.policy.inactive_threshold_days,
            "Inactive session sweep complete"
        );
        Ok(count)
    }

    /// Reconcile duplicate sessions: keep the most recently updated unexpired
    /// session per user. Re-running converges; duplicates created between
    /// sweeps are simply caught by the next pass.
    pub async fn cleanup_duplicates(&self) -> Result<u64, SessionError> {
        let count = self
            .sessions
            .delete_duplicates(Utc::now())
            .await
            .map_err(SessionError::Store)?;
        tracing::info!(deleted = count, "Duplicate session sweep complete");
        Ok(count)
    }

    /// Run all sweeps: expired first to shrink the candidate set for the
    /// other passes. Per-phase counts are logged before later phases run, so
    /// partial progress stays visible if a later phase fails.
    pub async fn cleanup_all(&self) -> Result<SweepReport, SessionError> {
        let expired_deleted = self.cleanup_expired().await?;
        let inactive_deleted = self.cleanup_inactive().await?;
        let duplicate_deleted = self.cleanup_duplicates().await?;

        let report = SweepReport {
            expired_deleted,
            inactive_deleted,
            duplicate_deleted,
        };
        tracing::info!(
            expired = report.expired_deleted,
            inactive = report.inactive_deleted,
            duplicates = report.duplicate_deleted,
            total = report.total(),
            "Session cleanup complete"
        );
        Ok(report)
    }

    /// Read-only store statistics.
    pub async fn session_metrics(&self) -> Result<SessionMetrics, SessionError> {
        self.sessions
            .metrics(Utc::now())
            .await
            .map_err(SessionError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_check_accepts_hyphenated_uuid() {
        let token = Uuid::new_v4().to_string();
        assert!(check_token_format(&token).is_ok());
    }

    #[test]
    fn format_check_rejects_wrong_length_and_charset() {
        // Simple (unhyphenated) form is valid to the uuid crate but not to
        // our cookie format.
        let simple = Uuid::new_v4().simple().to_string();
        assert!(matches!(
            check_token_format(&simple),
            Err(SessionError::MalformedToken)
        ));
        assert!(matches!(
            check_token_format(""),
            Err(SessionError::MalformedToken)
        ));
        assert!(matches!(
            check_token_format("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"),
            Err(SessionError::MalformedToken)
        ));
        assert!(matches!(
            check_token_format("not-a-uuid"),
            Err(SessionError::MalformedToken)
        ));
    }
}
