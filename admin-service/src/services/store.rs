//! Store traits and in-memory implementations.
//!
//! All session truth lives behind these traits. Production wires in the
//! Postgres implementations from `services::database`; tests wire in the
//! in-memory ones below. Handles are injected explicitly at process start
//! (no process-wide singletons).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AcademicEvent, AuditEvent, Campus, Session, SessionMetrics, User};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), anyhow::Error>;
    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>, anyhow::Error>;
    /// Refresh `updated_utc` (sliding-activity policy).
    async fn touch_session(
        &self,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error>;
    async fn delete_session(&self, session_id: Uuid) -> Result<bool, anyhow::Error>;
    /// Delete sessions with `expiry_utc` strictly before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, anyhow::Error>;
    /// Delete unexpired sessions whose `updated_utc` is before `cutoff`.
    async fn delete_idle(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, anyhow::Error>;
    /// For every user with more than one unexpired session, delete all but
    /// the most recently updated (ties broken by session id).
    async fn delete_duplicates(&self, now: DateTime<Utc>) -> Result<u64, anyhow::Error>;
    async fn metrics(&self, now: DateTime<Utc>) -> Result<SessionMetrics, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error>;
    async fn find_campus(&self, campus_id: Uuid) -> Result<Option<Campus>, anyhow::Error>;
    /// Campus ids granted to a multi-campus user.
    async fn granted_campuses(&self, user_id: Uuid) -> Result<Vec<Uuid>, anyhow::Error>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<(), anyhow::Error>;
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn insert_event(&self, event: &AcademicEvent) -> Result<(), anyhow::Error>;
    /// Events restricted to the given campuses; `None` means no restriction.
    async fn list_events(
        &self,
        campus_ids: Option<&[Uuid]>,
    ) -> Result<Vec<AcademicEvent>, anyhow::Error>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

fn poisoned(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("store mutex poisoned: {}", e)
}

/// In-memory session store. Counts row lookups so tests can assert the
/// malformed-token short circuit never touches the store, and can be flipped
/// into a failing state to exercise fail-closed behavior.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    pub lookups: AtomicU64,
    pub failing: AtomicBool,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            lookups: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), anyhow::Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(anyhow::anyhow!("session store unavailable"))
        } else {
            Ok(())
        }
    }

    /// Insert a fully specified row, bypassing `Session::new` defaults.
    /// Lets tests construct already-expired or stale sessions.
    pub fn seed(&self, session: Session) {
        self.sessions
            .lock()
            .expect("session store mutex poisoned")
            .insert(session.session_id, session);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert_session(&self, session: &Session) -> Result<(), anyhow::Error> {
        self.check_available()?;
        self.sessions
            .lock()
            .map_err(poisoned)?
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>, anyhow::Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let found = self
            .sessions
            .lock()
            .map_err(poisoned)?
            .get(&session_id)
            .cloned();
        Ok(found)
    }

    async fn touch_session(
        &self,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        self.check_available()?;
        if let Some(session) = self.sessions.lock().map_err(poisoned)?.get_mut(&session_id) {
            session.updated_utc = at;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, anyhow::Error> {
        self.check_available()?;
        let removed = self
            .sessions
            .lock()
            .map_err(poisoned)?
            .remove(&session_id)
            .is_some();
        Ok(removed)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, anyhow::Error> {
        self.check_available()?;
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.expiry_utc >= now);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_idle(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, anyhow::Error> {
        self.check_available()?;
        let mut sessions = self.sessions.lock().map_err(poisoned)?;
        let before = sessions.len();
        sessions.retain(|_, s| !(s.updated_utc < cutoff && s.expiry_utc >= now));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_duplicates(&self, now: DateTime<Utc>) -> Result<u64, anyhow::Error> {
        self.check_available()?;
        let mut sessions = self.sessions.lock().map_err(poisoned)?;

        // Latest unexpired session per user, ties broken by session id so
        // repeat sweeps converge on the same survivor.
        let mut keep: HashMap<Uuid, (DateTime<Utc>, Uuid)> = HashMap::new();
        for s in sessions.values().filter(|s| s.expiry_utc >= now) {
            let entry = keep
                .entry(s.user_id)
                .or_insert((s.updated_utc, s.session_id));
            if (s.updated_utc, s.session_id) > *entry {
                *entry = (s.updated_utc, s.session_id);
            }
        }

        let before = sessions.len();
        sessions.retain(|_, s| {
            s.expiry_utc < now
                || keep
                    .get(&s.user_id)
                    .map(|(_, id)| *id == s.session_id)
                    .unwrap_or(true)
        });
        Ok((before - sessions.len()) as u64)
    }

    async fn metrics(&self, now: DateTime<Utc>) -> Result<SessionMetrics, anyhow::Error> {
        self.check_available()?;
        let sessions = self.sessions.lock().map_err(poisoned)?;

        let mut metrics = SessionMetrics {
            total_sessions: sessions.len() as u64,
            ..Default::default()
        };

        let mut per_user: HashMap<Uuid, u64> = HashMap::new();
        let mut age_sum: i64 = 0;
        for s in sessions.values() {
            if s.expiry_utc >= now {
                metrics.active_sessions += 1;
            } else {
                metrics.expired_sessions += 1;
            }
            *per_user.entry(s.user_id).or_default() += 1;
            let age = (now - s.created_utc).num_seconds();
            age_sum += age;
            metrics.oldest_session_age_seconds = metrics.oldest_session_age_seconds.max(age);
        }
        metrics.users_with_sessions = per_user.len() as u64;
        metrics.most_sessions_per_user = per_user.values().copied().max().unwrap_or(0);
        if !sessions.is_empty() {
            metrics.average_session_age_seconds = age_sum / sessions.len() as i64;
        }
        Ok(metrics)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.check_available()
    }
}

/// In-memory user directory.
pub struct MemoryDirectoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    campuses: Mutex<HashMap<Uuid, Campus>>,
    grants: Mutex<HashMap<Uuid, Vec<Uuid>>>,
}

impl Default for MemoryDirectoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            campuses: Mutex::new(HashMap::new()),
            grants: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed_campus(&self, campus: Campus) {
        self.campuses
            .lock()
            .expect("campus store mutex poisoned")
            .insert(campus.campus_id, campus);
    }

    pub fn seed_user(&self, user: User) {
        self.users
            .lock()
            .expect("user store mutex poisoned")
            .insert(user.user_id, user);
    }

    pub fn seed_grants(&self, user_id: Uuid, campus_ids: Vec<Uuid>) {
        self.grants
            .lock()
            .expect("grant store mutex poisoned")
            .insert(user_id, campus_ids);
    }

    pub fn set_user_state(&self, user_id: Uuid, state_code: &str) {
        if let Some(user) = self
            .users
            .lock()
            .expect("user store mutex poisoned")
            .get_mut(&user_id)
        {
            user.user_state_code = state_code.to_string();
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        Ok(self.users.lock().map_err(poisoned)?.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let found = self
            .users
            .lock()
            .map_err(poisoned)?
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned();
        Ok(found)
    }

    async fn find_campus(&self, campus_id: Uuid) -> Result<Option<Campus>, anyhow::Error> {
        let found = self
            .campuses
            .lock()
            .map_err(poisoned)?
            .get(&campus_id)
            .cloned();
        Ok(found)
    }

    async fn granted_campuses(&self, user_id: Uuid) -> Result<Vec<Uuid>, anyhow::Error> {
        let grants = self
            .grants
            .lock()
            .map_err(poisoned)?
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        Ok(grants)
    }
}

/// In-memory audit sink. Events are exposed so tests can assert on them.
pub struct MemoryAuditStore {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events_for(&self, actor: Uuid) -> Vec<AuditEvent> {
        self.events
            .lock()
            .expect("audit store mutex poisoned")
            .iter()
            .filter(|e| e.actor_user_id == actor)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn record(&self, event: &AuditEvent) -> Result<(), anyhow::Error> {
        self.events.lock().map_err(poisoned)?.push(event.clone());
        Ok(())
    }
}

/// In-memory calendar store.
pub struct MemoryCalendarStore {
    events: Mutex<Vec<AcademicEvent>>,
}

impl Default for MemoryCalendarStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCalendarStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CalendarStore for MemoryCalendarStore {
    async fn insert_event(&self, event: &AcademicEvent) -> Result<(), anyhow::Error> {
        self.events.lock().map_err(poisoned)?.push(event.clone());
        Ok(())
    }

    async fn list_events(
        &self,
        campus_ids: Option<&[Uuid]>,
    ) -> Result<Vec<AcademicEvent>, anyhow::Error> {
        let events = self
            .events
            .lock()
            .map_err(poisoned)?
            .iter()
            .filter(|e| match campus_ids {
                Some(ids) => ids.contains(&e.campus_id),
                None => true,
            })
            .cloned()
            .collect();
        Ok(events)
    }
}
