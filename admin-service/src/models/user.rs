//! User model - platform accounts across institutions and campuses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Fixed user-type enumeration. The permission table in
/// `services::permissions` is total over these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    SystemAdmin,
    CampusAdmin,
    CampusCoordinator,
    CampusTeacher,
    CampusStudent,
    CampusParent,
    /// Legacy tenant-wide admin from before campus scoping existed.
    Admin,
    /// Legacy generic staff account.
    Staff,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::SystemAdmin => "SYSTEM_ADMIN",
            UserType::CampusAdmin => "CAMPUS_ADMIN",
            UserType::CampusCoordinator => "CAMPUS_COORDINATOR",
            UserType::CampusTeacher => "CAMPUS_TEACHER",
            UserType::CampusStudent => "CAMPUS_STUDENT",
            UserType::CampusParent => "CAMPUS_PARENT",
            UserType::Admin => "ADMIN",
            UserType::Staff => "STAFF",
        }
    }

    /// Parse a stored code. Unknown codes return `None`; callers must treat
    /// that as "no permissions", never as an error or an implicit allow.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "SYSTEM_ADMIN" => Some(UserType::SystemAdmin),
            "CAMPUS_ADMIN" => Some(UserType::CampusAdmin),
            "CAMPUS_COORDINATOR" => Some(UserType::CampusCoordinator),
            "CAMPUS_TEACHER" => Some(UserType::CampusTeacher),
            "CAMPUS_STUDENT" => Some(UserType::CampusStudent),
            "CAMPUS_PARENT" => Some(UserType::CampusParent),
            "ADMIN" => Some(UserType::Admin),
            "STAFF" => Some(UserType::Staff),
            _ => None,
        }
    }

    /// System-level roles are not bound to a campus.
    pub fn is_system_level(&self) -> bool {
        matches!(self, UserType::SystemAdmin | UserType::Admin)
    }
}

/// Breadth of campus data a granted role instance may act upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessScope {
    Single,
    Multi,
    All,
}

impl AccessScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessScope::Single => "single",
            AccessScope::Multi => "multi",
            AccessScope::All => "all",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "single" => Some(AccessScope::Single),
            "multi" => Some(AccessScope::Multi),
            "all" => Some(AccessScope::All),
            _ => None,
        }
    }
}

/// User state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    Active,
    Inactive,
}

impl UserState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserState::Active => "active",
            UserState::Inactive => "inactive",
        }
    }
}

/// User entity.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub user_type_code: String,
    pub access_scope_code: String,
    pub primary_campus_id: Option<Uuid>,
    pub user_state_code: String,
    pub password_hash: String,
    pub created_utc: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: String,
        display_name: Option<String>,
        user_type: UserType,
        access_scope: AccessScope,
        primary_campus_id: Option<Uuid>,
        password_hash: String,
    ) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            display_name,
            user_type_code: user_type.as_str().to_string(),
            access_scope_code: access_scope.as_str().to_string(),
            primary_campus_id,
            user_state_code: UserState::Active.as_str().to_string(),
            password_hash,
            created_utc: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.user_state_code == UserState::Active.as_str()
    }

    /// Resolved user type, `None` for unknown stored codes.
    pub fn user_type(&self) -> Option<UserType> {
        UserType::from_code(&self.user_type_code)
    }

    pub fn access_scope(&self) -> Option<AccessScope> {
        AccessScope::from_code(&self.access_scope_code)
    }
}

/// User response for the API (no password hash).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub user_type_code: String,
    pub access_scope_code: String,
    pub primary_campus_id: Option<Uuid>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            display_name: u.display_name,
            user_type_code: u.user_type_code,
            access_scope_code: u.access_scope_code,
            primary_campus_id: u.primary_campus_id,
        }
    }
}
