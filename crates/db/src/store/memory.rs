use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use gpsflow_core::domain::request::{Request, RequestId, RequestStatus};
use gpsflow_core::domain::vehicle::Vehicle;

use super::{RequestStore, StoreError, VehicleDirectory};

/// In-memory store with the same revision-guard semantics as the SQL
/// implementation; the workflow tests run against this.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<String, Request>>,
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(&self, request: Request) -> Result<(), StoreError> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id.0) {
            return Err(StoreError::DuplicateRequest(request.id));
        }
        requests.insert(request.id.0.clone(), request);
        Ok(())
    }

    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, StoreError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).cloned())
    }

    async fn update(&self, request: Request, expected_revision: i64) -> Result<(), StoreError> {
        let mut requests = self.requests.write().await;
        match requests.get(&request.id.0) {
            Some(stored) if stored.revision == expected_revision => {
                requests.insert(request.id.0.clone(), request);
                Ok(())
            }
            _ => Err(StoreError::RevisionConflict { id: request.id, expected_revision }),
        }
    }

    async fn list_all(&self) -> Result<Vec<Request>, StoreError> {
        let requests = self.requests.read().await;
        let mut listed: Vec<Request> = requests.values().cloned().collect();
        listed.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| right.id.0.cmp(&left.id.0))
        });
        Ok(listed)
    }

    async fn list_awaiting_rh(&self) -> Result<Vec<Request>, StoreError> {
        let mut listed = self.list_all().await?;
        listed.retain(|request| {
            request.status == RequestStatus::ParallelReview && !request.rh_approval
        });
        listed.reverse();
        Ok(listed)
    }
}

#[derive(Default)]
pub struct InMemoryVehicleDirectory {
    vehicles: RwLock<HashMap<String, Vehicle>>,
}

#[async_trait]
impl VehicleDirectory for InMemoryVehicleDirectory {
    async fn find_by_number(&self, vehicle_number: &str) -> Result<Option<Vehicle>, StoreError> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles.get(&vehicle_number.to_ascii_uppercase()).cloned())
    }

    async fn is_registered(&self, vehicle_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .find_by_number(vehicle_number)
            .await?
            .map(|vehicle| vehicle.is_registered)
            .unwrap_or(false))
    }

    async fn save(&self, vehicle: Vehicle) -> Result<(), StoreError> {
        let mut vehicles = self.vehicles.write().await;
        vehicles.insert(vehicle.vehicle_number.to_ascii_uppercase(), vehicle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gpsflow_core::domain::actor::{Actor, Role};
    use gpsflow_core::domain::request::{NewRequest, Request, RequestType, VehicleRef};
    use gpsflow_core::domain::vehicle::Vehicle;

    use crate::store::{
        InMemoryRequestStore, InMemoryVehicleDirectory, RequestStore, StoreError, VehicleDirectory,
    };

    fn sample_request(vehicle_number: &str) -> Request {
        Request::submitted(
            NewRequest {
                vehicles: vec![VehicleRef::new(vehicle_number)],
                city: "Bangalore".to_string(),
                client_name: "Amazon".to_string(),
                driver_details: Vec::new(),
                request_type: RequestType::NewTrip,
                vendor_name: None,
            },
            &Actor {
                id: "u1".to_string(),
                name: "John Operator".to_string(),
                role: Role::FieldOperator,
            },
        )
    }

    #[tokio::test]
    async fn round_trip_and_duplicate_rejection() {
        let store = InMemoryRequestStore::default();
        let request = sample_request("KA-01-ME-1234");

        store.insert(request.clone()).await.expect("insert");
        let found = store.find_by_id(&request.id).await.expect("find");
        assert_eq!(found, Some(request.clone()));

        let error = store.insert(request).await.expect_err("duplicate");
        assert!(matches!(error, StoreError::DuplicateRequest(_)));
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = InMemoryRequestStore::default();
        let request = sample_request("KA-01-ME-1234");
        store.insert(request.clone()).await.expect("insert");

        let mut updated = request.clone();
        updated.rh_approval = true;
        updated.revision = 2;
        store.update(updated, 1).await.expect("first writer wins");

        let mut stale = request;
        stale.payment_approval = true;
        stale.revision = 2;
        let error = store.update(stale, 1).await.expect_err("second writer loses");
        assert!(matches!(error, StoreError::RevisionConflict { .. }));
    }

    #[tokio::test]
    async fn directory_round_trip() {
        let directory = InMemoryVehicleDirectory::default();
        directory
            .save(Vehicle {
                id: "v1".to_string(),
                vehicle_number: "KA-01-ME-1234".to_string(),
                client_name: "Amazon".to_string(),
                city: "Bangalore".to_string(),
                is_registered: true,
            })
            .await
            .expect("save");

        assert!(directory.is_registered("ka-01-me-1234").await.expect("lookup"));
        assert!(!directory.is_registered("DL-04-XY-9012").await.expect("lookup"));
    }
}
