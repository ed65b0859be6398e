//! Academic calendar model - the campus-scoped resource behind the
//! calendar permission actions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct AcademicEvent {
    pub event_id: Uuid,
    pub campus_id: Uuid,
    pub title: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub created_by: Uuid,
    pub created_utc: DateTime<Utc>,
}

impl AcademicEvent {
    pub fn new(
        campus_id: Uuid,
        title: String,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
        created_by: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            campus_id,
            title,
            starts_on,
            ends_on,
            created_by,
            created_utc: Utc::now(),
        }
    }
}
