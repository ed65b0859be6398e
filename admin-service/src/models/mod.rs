//! Domain models for the admin service.

mod audit_event;
mod calendar;
mod campus;
mod session;
mod user;

pub use audit_event::{AuditEvent, AuditOutcome};
pub use calendar::AcademicEvent;
pub use campus::Campus;
pub use session::{Session, SessionInfo, SessionMetrics, SweepReport};
pub use user::{AccessScope, User, UserResponse, UserState, UserType};
