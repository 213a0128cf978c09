use serde::Serialize;

use gpsflow_core::domain::vehicle::Vehicle;

use crate::store::{StoreError, VehicleDirectory};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub vehicles_seeded: usize,
}

/// Deterministic demo registry: two registered vehicles and one that forces
/// the new-trip path.
pub fn seed_vehicles() -> Vec<Vehicle> {
    vec![
        Vehicle {
            id: "v1".to_string(),
            vehicle_number: "KA-01-ME-1234".to_string(),
            client_name: "Amazon".to_string(),
            city: "Bangalore".to_string(),
            is_registered: true,
        },
        Vehicle {
            id: "v2".to_string(),
            vehicle_number: "MH-12-AB-5678".to_string(),
            client_name: "Flipkart".to_string(),
            city: "Pune".to_string(),
            is_registered: true,
        },
        Vehicle {
            id: "v3".to_string(),
            vehicle_number: "DL-04-XY-9012".to_string(),
            client_name: "Delhivery".to_string(),
            city: "Delhi".to_string(),
            is_registered: false,
        },
    ]
}

pub async fn seed<D: VehicleDirectory>(directory: &D) -> Result<SeedResult, StoreError> {
    let vehicles = seed_vehicles();
    let count = vehicles.len();
    for vehicle in vehicles {
        directory.save(vehicle).await?;
    }
    Ok(SeedResult { vehicles_seeded: count })
}
