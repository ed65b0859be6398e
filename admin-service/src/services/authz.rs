//! Authorization gate.
//!
//! The single enforcement point in front of every protected operation:
//! session -> user -> permission set -> scope check. It decides; it never
//! runs the business query itself. Callers narrow their queries with the
//! returned context and emit audit records driven by the decision.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccessScope, User, UserType};
use crate::services::permissions::{has_permission, Action};
use crate::services::session::{SessionError, SessionService};
use crate::services::store::DirectoryStore;
use platform_core::error::AppError;

/// The scope a request wants to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    /// Not campus-scoped (system-level resources).
    Global,
    /// Rows tagged with this campus.
    Campus(Uuid),
}

/// The campus breadth a user may actually act on, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveScope {
    AllCampuses,
    Campuses(Vec<Uuid>),
}

impl EffectiveScope {
    pub fn permits(&self, campus_id: Uuid) -> bool {
        match self {
            EffectiveScope::AllCampuses => true,
            EffectiveScope::Campuses(ids) => ids.contains(&campus_id),
        }
    }

    /// Filter for scoped queries: `None` means unrestricted.
    pub fn campus_filter(&self) -> Option<&[Uuid]> {
        match self {
            EffectiveScope::AllCampuses => None,
            EffectiveScope::Campuses(ids) => Some(ids),
        }
    }
}

/// Resolved authorization context, produced once by the gate and threaded
/// through the request; never re-derived per business operation.
#[derive(Debug, Clone)]
pub struct AuthzContext {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub scope: EffectiveScope,
}

#[derive(Debug, Error)]
pub enum AuthzError {
    /// Session resolution failed; the inner error says exactly why. Store
    /// failures also land here: ambiguous authorization state fails closed.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[source] SessionError),

    #[error("Action not permitted for this role")]
    Unauthorized,

    /// The action itself is permitted but the target campus is outside the
    /// user's access scope. Distinct from `Unauthorized` so audit rows can
    /// tell the two apart.
    #[error("Target campus outside the user's access scope")]
    ScopeViolation,
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            // 401 with a generic body; the reason stays in the logs.
            AuthzError::Unauthenticated(_) => {
                AppError::Unauthorized(anyhow::anyhow!("Authentication required"))
            }
            AuthzError::Unauthorized | AuthzError::ScopeViolation => {
                AppError::Forbidden(anyhow::anyhow!("Not permitted"))
            }
        }
    }
}

#[derive(Clone)]
pub struct AuthzGate {
    sessions: SessionService,
    directory: Arc<dyn DirectoryStore>,
}

impl AuthzGate {
    pub fn new(sessions: SessionService, directory: Arc<dyn DirectoryStore>) -> Self {
        Self {
            sessions,
            directory,
        }
    }

    /// Resolve a session token to a full authorization context without
    /// checking a specific action. Used by the gate middleware; per-action
    /// checks then run against the returned context.
    pub async fn resolve(&self, token: &str) -> Result<AuthzContext, AuthzError> {
        let validated = self.sessions.validate(token).await.map_err(|e| {
            if let SessionError::Store(ref inner) = e {
                // Fail closed, but make sure operators can see the real cause.
                tracing::error!(error = %inner, "Session store failure during validation");
            }
            AuthzError::Unauthenticated(e)
        })?;

        let user = validated.user;
        // Unknown stored type codes resolve to no permissions at check time;
        // authentication itself still succeeds with an empty-scope context.
        let user_type = match user.user_type() {
            Some(t) => t,
            None => {
                tracing::warn!(
                    user_id = %user.user_id,
                    code = %user.user_type_code,
                    "Unknown user type code; treating as no permissions"
                );
                return Err(AuthzError::Unauthorized);
            }
        };

        let scope = self.resolve_scope(&user).await?;

        Ok(AuthzContext {
            user_id: user.user_id,
            user_type,
            scope,
        })
    }

    /// Action and scope check against an already resolved context.
    pub fn check(
        &self,
        context: &AuthzContext,
        action: Action,
        resource: ResourceScope,
    ) -> Result<(), AuthzError> {
        if !has_permission(context.user_type, action) {
            return Err(AuthzError::Unauthorized);
        }

        if let ResourceScope::Campus(campus_id) = resource {
            if !context.scope.permits(campus_id) {
                return Err(AuthzError::ScopeViolation);
            }
        }

        Ok(())
    }

    async fn resolve_scope(&self, user: &User) -> Result<EffectiveScope, AuthzError> {
        let scope = match user.access_scope() {
            Some(AccessScope::All) => EffectiveScope::AllCampuses,
            Some(AccessScope::Single) => {
                EffectiveScope::Campuses(user.primary_campus_id.into_iter().collect())
            }
            Some(AccessScope::Multi) => {
                let granted = self
                    .directory
                    .granted_campuses(user.user_id)
                    .await
                    .map_err(|e| {
                        tracing::error!(error = %e, "Store failure resolving campus grants");
                        AuthzError::Unauthenticated(SessionError::Store(e))
                    })?;
                EffectiveScope::Campuses(granted)
            }
            // Unknown scope code: no campus access at all.
            None => {
                tracing::warn!(
                    user_id = %user.user_id,
                    code = %user.access_scope_code,
                    "Unknown access scope code; granting no campus access"
                );
                EffectiveScope::Campuses(Vec::new())
            }
        };
        Ok(scope)
    }
}
