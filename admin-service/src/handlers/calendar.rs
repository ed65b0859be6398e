use axum::{
    extract::{OriginalUri, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    dtos::calendar::{CreateEventRequest, ListEventsQuery},
    middleware::Authenticated,
    models::{AcademicEvent, AuditOutcome},
    services::{Action, AuthzError, CalendarStore, DirectoryStore, ResourceScope},
    utils::ValidatedJson,
    AppState,
};
use platform_core::error::AppError;

/// List academic calendar events visible to the caller
#[utoipa::path(
    get,
    path = "/admin/calendar/events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Events within the caller's scope", body = [AcademicEvent]),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Calendar"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    // Permission first, then scope. An explicit campus_id outside the
    // caller's scope is a scope violation, not an empty result.
    state
        .authz
        .check(&context, Action::ViewCalendar, ResourceScope::Global)?;

    let requested = match query.campus_id {
        Some(campus_id) => {
            if !context.scope.permits(campus_id) {
                return Err(AuthzError::ScopeViolation.into());
            }
            Some(vec![campus_id])
        }
        None => context.scope.campus_filter().map(|ids| ids.to_vec()),
    };

    let events = state
        .calendar
        .list_events(requested.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list calendar events");
            AppError::InternalError(anyhow::anyhow!("Failed to list events"))
        })?;

    Ok((StatusCode::OK, Json(events)))
}

/// Create an academic calendar event
#[utoipa::path(
    post,
    path = "/admin/calendar/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = AcademicEvent),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "Unknown campus", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Calendar"
)]
pub async fn create_event(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
    OriginalUri(uri): OriginalUri,
    ValidatedJson(req): ValidatedJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let path = uri.path().to_string();

    if req.ends_on < req.starts_on {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "ends_on must not precede starts_on"
        )));
    }

    if let Err(e) = state.authz.check(
        &context,
        Action::CreateAcademicEvent,
        ResourceScope::Campus(req.campus_id),
    ) {
        let outcome = match e {
            AuthzError::ScopeViolation => AuditOutcome::ScopeDenied,
            _ => AuditOutcome::Denied,
        };
        state.audit.decision(
            context.user_id,
            Action::CreateAcademicEvent,
            outcome,
            Some(req.campus_id),
            &path,
        );
        return Err(e.into());
    }

    // Scope is checked first so out-of-scope probes cannot tell whether a
    // campus exists.
    let campus = state
        .directory
        .find_campus(req.campus_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up campus");
            AppError::InternalError(anyhow::anyhow!("Failed to look up campus"))
        })?;
    if campus.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Unknown campus")));
    }

    let event = AcademicEvent::new(
        req.campus_id,
        req.title,
        req.starts_on,
        req.ends_on,
        context.user_id,
    );

    state.calendar.insert_event(&event).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to insert calendar event");
        AppError::InternalError(anyhow::anyhow!("Failed to create event"))
    })?;

    state.audit.mutation(
        context.user_id,
        Action::CreateAcademicEvent,
        Some(event.campus_id),
        &path,
        None,
        serde_json::to_value(&event).ok(),
    );

    tracing::info!(
        event_id = %event.event_id,
        campus_id = %event.campus_id,
        user_id = %context.user_id,
        "Calendar event created"
    );

    Ok((StatusCode::CREATED, Json(event)))
}
