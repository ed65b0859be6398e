//! Audit event model - append-only record of authorization decisions and
//! session lifecycle changes. Rows are never updated or deleted by normal
//! flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Decision outcomes recorded against an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Allowed,
    Denied,
    /// Permission was held but the target campus was outside the actor's
    /// access scope. Kept distinct from `Denied` for audit granularity.
    ScopeDenied,
    SessionCreated,
    SessionRevoked,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Allowed => "allowed",
            AuditOutcome::Denied => "denied",
            AuditOutcome::ScopeDenied => "scope_denied",
            AuditOutcome::SessionCreated => "session_created",
            AuditOutcome::SessionRevoked => "session_revoked",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub actor_user_id: Uuid,
    pub action_code: String,
    pub outcome_code: String,
    pub campus_id: Option<Uuid>,
    pub request_path: Option<String>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub created_utc: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(actor_user_id: Uuid, action_code: &str, outcome: AuditOutcome) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            actor_user_id,
            action_code: action_code.to_string(),
            outcome_code: outcome.as_str().to_string(),
            campus_id: None,
            request_path: None,
            before_state: None,
            after_state: None,
            created_utc: Utc::now(),
        }
    }

    pub fn with_campus(mut self, campus_id: Option<Uuid>) -> Self {
        self.campus_id = campus_id;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = Some(path.into());
        self
    }

    pub fn with_states(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before_state = before;
        self.after_state = after;
        self
    }
}
