//! Services layer: session lifecycle, authorization, audit, and storage.

pub mod audit;
pub mod authz;
mod database;
pub mod permissions;
pub mod session;
pub mod store;

pub use audit::AuditService;
pub use authz::{AuthzContext, AuthzError, AuthzGate, EffectiveScope, ResourceScope};
pub use database::Database;
pub use permissions::{has_all, has_any, has_permission, permissions_for, Action};
pub use session::{check_token_format, SessionError, SessionPolicy, SessionService};
pub use store::{
    AuditStore, CalendarStore, DirectoryStore, MemoryAuditStore, MemoryCalendarStore,
    MemoryDirectoryStore, MemorySessionStore, SessionStore,
};
