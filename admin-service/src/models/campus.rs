//! Campus model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A physical or virtual campus owned by an institution. Scoped rows
/// throughout the schema are tagged with a `campus_id`.
#[derive(Debug, Clone, FromRow)]
pub struct Campus {
    pub campus_id: Uuid,
    pub institution_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}
