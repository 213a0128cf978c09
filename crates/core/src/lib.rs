pub mod audit;
pub mod config;
pub mod convergence;
pub mod domain;
pub mod errors;
pub mod stats;

pub use audit::AuditEntry;
pub use convergence::{dispatch, review, ReviewDecision, ReviewOutcome, TransitionError};
pub use domain::actor::{Actor, ReviewerRole, Role};
pub use domain::request::{
    DriverDetail, GpsService, NewRequest, Request, RequestId, RequestStatus, RequestType,
    VehicleRef,
};
pub use domain::vehicle::Vehicle;
pub use errors::ValidationError;
pub use stats::{snapshot, RequestStats, StatusCounts};
