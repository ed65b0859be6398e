//! Static role/permission model.
//!
//! The mapping from user type to permitted actions is configuration data
//! compiled into the binary, not derived from the database at runtime. That
//! keeps authorization checks synchronous and allocation-free on every
//! request. Institution-specific overrides, if ever needed, belong in the
//! scope check layer, not in this table.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::UserType;

/// Fixed, versioned enumeration of permission action codes. Adding an action
/// means updating `permissions_for` for every user type; the exhaustive
/// match below makes a missed type a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ViewCalendar,
    CreateHoliday,
    UpdateHoliday,
    DeleteHoliday,
    CreateAcademicEvent,
    UpdateAcademicEvent,
    DeleteAcademicEvent,
    CreateSchedulePattern,
    UpdateSchedulePattern,
    DeleteSchedulePattern,
    ExportCalendar,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewCalendar => "VIEW_CALENDAR",
            Action::CreateHoliday => "CREATE_HOLIDAY",
            Action::UpdateHoliday => "UPDATE_HOLIDAY",
            Action::DeleteHoliday => "DELETE_HOLIDAY",
            Action::CreateAcademicEvent => "CREATE_ACADEMIC_EVENT",
            Action::UpdateAcademicEvent => "UPDATE_ACADEMIC_EVENT",
            Action::DeleteAcademicEvent => "DELETE_ACADEMIC_EVENT",
            Action::CreateSchedulePattern => "CREATE_SCHEDULE_PATTERN",
            Action::UpdateSchedulePattern => "UPDATE_SCHEDULE_PATTERN",
            Action::DeleteSchedulePattern => "DELETE_SCHEDULE_PATTERN",
            Action::ExportCalendar => "EXPORT_CALENDAR",
        }
    }

    /// Mutating actions trigger audit records when they pass (or fail)
    /// authorization.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::ViewCalendar | Action::ExportCalendar)
    }
}

const ALL_ACTIONS: &[Action] = &[
    Action::ViewCalendar,
    Action::CreateHoliday,
    Action::UpdateHoliday,
    Action::DeleteHoliday,
    Action::CreateAcademicEvent,
    Action::UpdateAcademicEvent,
    Action::DeleteAcademicEvent,
    Action::CreateSchedulePattern,
    Action::UpdateSchedulePattern,
    Action::DeleteSchedulePattern,
    Action::ExportCalendar,
];

const COORDINATOR_ACTIONS: &[Action] = &[
    Action::ViewCalendar,
    Action::CreateHoliday,
    Action::UpdateHoliday,
    Action::CreateAcademicEvent,
    Action::UpdateAcademicEvent,
    Action::CreateSchedulePattern,
    Action::UpdateSchedulePattern,
    Action::ExportCalendar,
];

const TEACHER_ACTIONS: &[Action] = &[Action::ViewCalendar, Action::ExportCalendar];

const VIEW_ONLY_ACTIONS: &[Action] = &[Action::ViewCalendar];

/// Permitted actions for a user type. Total over the enumeration: every
/// variant maps to a defined set. Callers holding an unparseable type code
/// (`UserType::from_code` returned `None`) must use the empty set.
pub fn permissions_for(user_type: UserType) -> &'static [Action] {
    match user_type {
        UserType::SystemAdmin | UserType::Admin | UserType::CampusAdmin => ALL_ACTIONS,
        UserType::CampusCoordinator => COORDINATOR_ACTIONS,
        UserType::CampusTeacher => TEACHER_ACTIONS,
        UserType::CampusStudent | UserType::CampusParent | UserType::Staff => VIEW_ONLY_ACTIONS,
    }
}

pub fn has_permission(user_type: UserType, action: Action) -> bool {
    permissions_for(user_type).contains(&action)
}

pub fn has_any(user_type: UserType, actions: &[Action]) -> bool {
    actions.iter().any(|a| has_permission(user_type, *a))
}

pub fn has_all(user_type: UserType, actions: &[Action]) -> bool {
    actions.iter().all(|a| has_permission(user_type, *a))
}
