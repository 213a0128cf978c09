use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::domain::actor::Actor;
use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        let fragment = Uuid::new_v4().simple().to_string();
        Self(format!("REQ-{}", fragment[..9].to_ascii_uppercase()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Legacy alias of the initial state; never produced by a transition.
    RequestCreated,
    ParallelReview,
    VendorCoordination,
    Completed,
    Halted,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestCreated => "REQUEST_CREATED",
            Self::ParallelReview => "PARALLEL_REVIEW",
            Self::VendorCoordination => "VENDOR_COORDINATION",
            Self::Completed => "COMPLETED",
            Self::Halted => "HALTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Halted)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown request status `{0}`")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REQUEST_CREATED" => Ok(Self::RequestCreated),
            "PARALLEL_REVIEW" => Ok(Self::ParallelReview),
            "VENDOR_COORDINATION" => Ok(Self::VendorCoordination),
            "COMPLETED" => Ok(Self::Completed),
            "HALTED" => Ok(Self::Halted),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    GpsInstallation,
    NewTrip,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GpsInstallation => "GPS_INSTALLATION",
            Self::NewTrip => "NEW_TRIP",
        }
    }

    /// Label used in the creation audit entry ("GPS INSTALLATION" / "NEW TRIP").
    pub fn human_label(self) -> &'static str {
        match self {
            Self::GpsInstallation => "GPS INSTALLATION",
            Self::NewTrip => "NEW TRIP",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown request type `{0}`")]
pub struct UnknownRequestType(pub String);

impl std::str::FromStr for RequestType {
    type Err = UnknownRequestType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "GPS_INSTALLATION" => Ok(Self::GpsInstallation),
            "NEW_TRIP" => Ok(Self::NewTrip),
            other => Err(UnknownRequestType(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpsService {
    Fleetx,
    Wheelseye,
}

impl GpsService {
    pub fn price(self) -> Decimal {
        match self {
            Self::Fleetx => Decimal::new(2_000, 0),
            Self::Wheelseye => Decimal::new(3_000, 0),
        }
    }

    pub fn refundable(self) -> bool {
        matches!(self, Self::Fleetx)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRef {
    pub vehicle_number: String,
}

impl VehicleRef {
    pub fn new(vehicle_number: impl Into<String>) -> Self {
        Self { vehicle_number: vehicle_number.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDetail {
    pub vehicle_number: String,
    pub driver_name: String,
    pub driver_number: String,
    pub selected_service: GpsService,
    pub reporting_time: String,
}

/// Indian plate format: two letters, two digits, one or two letters, four
/// digits, dash-separated, uppercase (e.g. `KA-01-ME-1234`).
pub fn is_plate_format(value: &str) -> bool {
    let mut parts = value.split('-');
    let (Some(state), Some(district), Some(series), Some(number), None) =
        (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    state.len() == 2
        && state.chars().all(|c| c.is_ascii_uppercase())
        && district.len() == 2
        && district.chars().all(|c| c.is_ascii_digit())
        && (1..=2).contains(&series.len())
        && series.chars().all(|c| c.is_ascii_uppercase())
        && number.len() == 4
        && number.chars().all(|c| c.is_ascii_digit())
}

/// Validated submission input; `request_type` is checked against the vehicle
/// directory by the workflow service before a `Request` is built from this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub vehicles: Vec<VehicleRef>,
    pub city: String,
    pub client_name: String,
    pub driver_details: Vec<DriverDetail>,
    pub request_type: RequestType,
    pub vendor_name: Option<String>,
}

impl NewRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.vehicles.is_empty() {
            return Err(ValidationError::EmptyVehicles);
        }
        if self.city.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "city" });
        }
        if self.client_name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "client_name" });
        }

        let mut seen = std::collections::HashSet::new();
        for vehicle in &self.vehicles {
            if !is_plate_format(&vehicle.vehicle_number) {
                return Err(ValidationError::PlateFormat {
                    vehicle_number: vehicle.vehicle_number.clone(),
                });
            }
            if !seen.insert(vehicle.vehicle_number.to_ascii_uppercase()) {
                return Err(ValidationError::DuplicateVehicle {
                    vehicle_number: vehicle.vehicle_number.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub vehicles: Vec<VehicleRef>,
    pub city: String,
    pub client_name: String,
    pub driver_details: Vec<DriverDetail>,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub rh_approval: bool,
    pub payment_approval: bool,
    pub vendor_name: Option<String>,
    pub rejection_reason: Option<String>,
    pub notification_timestamp: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
    pub history: Vec<AuditEntry>,
}

impl Request {
    /// Builds the freshly-submitted entity: parallel review, neither flag
    /// set, a single creation audit entry with no prior status.
    pub fn submitted(input: NewRequest, actor: &Actor) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::generate(),
            vehicles: input.vehicles,
            city: input.city,
            client_name: input.client_name,
            driver_details: input.driver_details,
            request_type: input.request_type,
            status: RequestStatus::ParallelReview,
            rh_approval: false,
            payment_approval: false,
            vendor_name: input.vendor_name,
            rejection_reason: None,
            notification_timestamp: None,
            created_by: actor.name.clone(),
            created_at: now,
            updated_at: now,
            revision: 1,
            history: vec![AuditEntry::creation(actor, input.request_type)],
        }
    }
}
