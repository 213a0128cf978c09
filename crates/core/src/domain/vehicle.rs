use serde::{Deserialize, Serialize};

/// Registry record backing request-type derivation: a request whose vehicles
/// are all pre-registered is a GPS installation, anything else a new trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub vehicle_number: String,
    pub client_name: String,
    pub city: String,
    pub is_registered: bool,
}
