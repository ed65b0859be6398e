use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    pub campus_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEventsQuery {
    /// Restrict to one campus; must still be inside the caller's scope.
    pub campus_id: Option<Uuid>,
}
