#![forbid(unsafe_code)]

pub mod aggregation;
pub mod error;
pub mod session;
pub mod submission;

pub use checkin_core::Clock;

pub use aggregation::{AggregationEngine, DashboardHandle, DashboardPhase, DashboardSnapshot};
pub use error::{AggregationError, SessionError, SubmitError};
pub use session::{AuthState, Role, Session};
pub use submission::SubmissionService;
