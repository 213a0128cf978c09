use thiserror::Error;

pub use crate::convergence::TransitionError;

/// Input problems rejected before any state change; no audit entry is
/// written for these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one vehicle is required")]
    EmptyVehicles,
    #[error("vehicle `{vehicle_number}` appears more than once in the request")]
    DuplicateVehicle { vehicle_number: String },
    #[error("vehicle number `{vehicle_number}` does not match the plate format XX-00-XX-0000")]
    PlateFormat { vehicle_number: String },
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("vehicle `{vehicle_number}` is not registered for GPS installation")]
    UnregisteredVehicle { vehicle_number: String },
    #[error("a rejection reason is required")]
    BlankRejectionReason,
}
