//! Audit emission.
//!
//! Append-only records of authorization decisions and session lifecycle
//! changes. Writes are spawned off the request path: losing an audit row to
//! a store hiccup is logged, never turned into a request failure.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{AuditEvent, AuditOutcome};
use crate::services::permissions::Action;
use crate::services::store::AuditStore;

#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    fn emit(&self, event: AuditEvent) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.record(&event).await {
                tracing::error!(
                    event_id = %event.event_id,
                    action = %event.action_code,
                    error = %e,
                    "Failed to persist audit event"
                );
            }
        });
    }

    /// Record an authorization decision on a mutating action.
    pub fn decision(
        &self,
        actor: Uuid,
        action: Action,
        outcome: AuditOutcome,
        campus_id: Option<Uuid>,
        path: &str,
    ) {
        self.emit(
            AuditEvent::new(actor, action.as_str(), outcome)
                .with_campus(campus_id)
                .with_path(path),
        );
    }

    /// Record a mutating action together with its before/after snapshots.
    pub fn mutation(
        &self,
        actor: Uuid,
        action: Action,
        campus_id: Option<Uuid>,
        path: &str,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) {
        self.emit(
            AuditEvent::new(actor, action.as_str(), AuditOutcome::Allowed)
                .with_campus(campus_id)
                .with_path(path)
                .with_states(before, after),
        );
    }

    /// Record a session lifecycle change (login/logout).
    pub fn session_event(&self, actor: Uuid, outcome: AuditOutcome, path: &str) {
        self.emit(AuditEvent::new(actor, "SESSION", outcome).with_path(path));
    }
}
