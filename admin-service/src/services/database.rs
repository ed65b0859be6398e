//! PostgreSQL store implementations.
//!
//! One pool-backed wrapper implements every store trait; all mutations go
//! through sqlx so batch deletes are atomic per statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::models::{AcademicEvent, AuditEvent, Campus, Session, SessionMetrics, User};
use crate::services::store::{AuditStore, CalendarStore, DirectoryStore, SessionStore};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn insert_session(&self, session: &Session) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, created_utc, updated_utc, expiry_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(session.created_utc)
        .bind(session.updated_utc)
        .bind(session.expiry_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<Session>, anyhow::Error> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }

    async fn touch_session(
        &self,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE sessions SET updated_utc = $1 WHERE session_id = $2")
            .bind(at)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, anyhow::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expiry_utc < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(result.rows_affected())
    }

    async fn delete_idle(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, anyhow::Error> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE updated_utc < $1 AND expiry_utc >= $2")
                .bind(cutoff)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        Ok(result.rows_affected())
    }

    async fn delete_duplicates(&self, now: DateTime<Utc>) -> Result<u64, anyhow::Error> {
        // Rank unexpired sessions per user by recency; everything below the
        // top rank goes. Ties broken by session_id so reruns converge.
        let result = sqlx::query(
            r#"
            DELETE FROM sessions s
            USING (
                SELECT session_id,
                       ROW_NUMBER() OVER (
                           PARTITION BY user_id
                           ORDER BY updated_utc DESC, session_id DESC
                       ) AS recency_rank
                FROM sessions
                WHERE expiry_utc >= $1
            ) ranked
            WHERE s.session_id = ranked.session_id AND ranked.recency_rank > 1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
        Ok(result.rows_affected())
    }

    async fn metrics(&self, now: DateTime<Utc>) -> Result<SessionMetrics, anyhow::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_sessions,
                COUNT(*) FILTER (WHERE expiry_utc >= $1) AS active_sessions,
                COUNT(*) FILTER (WHERE expiry_utc < $1) AS expired_sessions,
                COUNT(DISTINCT user_id) AS users_with_sessions,
                COALESCE(MAX(EXTRACT(EPOCH FROM $1 - created_utc))::BIGINT, 0) AS oldest_age,
                COALESCE(AVG(EXTRACT(EPOCH FROM $1 - created_utc))::BIGINT, 0) AS average_age
            FROM sessions
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

        let most: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(cnt) FROM (SELECT COUNT(*) AS cnt FROM sessions GROUP BY user_id) per_user",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

        Ok(SessionMetrics {
            total_sessions: row.get::<i64, _>("total_sessions") as u64,
            active_sessions: row.get::<i64, _>("active_sessions") as u64,
            expired_sessions: row.get::<i64, _>("expired_sessions") as u64,
            users_with_sessions: row.get::<i64, _>("users_with_sessions") as u64,
            most_sessions_per_user: most.unwrap_or(0) as u64,
            oldest_session_age_seconds: row.get::<i64, _>("oldest_age"),
            average_session_age_seconds: row.get::<i64, _>("average_age"),
        })
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))
    }
}

#[async_trait]
impl DirectoryStore for Database {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }

    async fn find_campus(&self, campus_id: Uuid) -> Result<Option<Campus>, anyhow::Error> {
        sqlx::query_as::<_, Campus>("SELECT * FROM campuses WHERE campus_id = $1")
            .bind(campus_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }

    async fn granted_campuses(&self, user_id: Uuid) -> Result<Vec<Uuid>, anyhow::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT campus_id FROM user_campus_access WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl AuditStore for Database {
    async fn record(&self, event: &AuditEvent) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_events
                (event_id, actor_user_id, action_code, outcome_code, campus_id,
                 request_path, before_state, after_state, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.event_id)
        .bind(event.actor_user_id)
        .bind(&event.action_code)
        .bind(&event.outcome_code)
        .bind(event.campus_id)
        .bind(&event.request_path)
        .bind(&event.before_state)
        .bind(&event.after_state)
        .bind(event.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for Database {
    async fn insert_event(&self, event: &AcademicEvent) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO academic_events
                (event_id, campus_id, title, starts_on, ends_on, created_by, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.event_id)
        .bind(event.campus_id)
        .bind(&event.title)
        .bind(event.starts_on)
        .bind(event.ends_on)
        .bind(event.created_by)
        .bind(event.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    }

    async fn list_events(
        &self,
        campus_ids: Option<&[Uuid]>,
    ) -> Result<Vec<AcademicEvent>, anyhow::Error> {
        match campus_ids {
            Some(ids) => sqlx::query_as::<_, AcademicEvent>(
                "SELECT * FROM academic_events WHERE campus_id = ANY($1) ORDER BY starts_on",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e)),
            None => sqlx::query_as::<_, AcademicEvent>(
                "SELECT * FROM academic_events ORDER BY starts_on",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!(e)),
        }
    }
}
