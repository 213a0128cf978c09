use async_trait::async_trait;
use thiserror::Error;

use gpsflow_core::domain::request::{Request, RequestId};
use gpsflow_core::domain::vehicle::Vehicle;

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryRequestStore, InMemoryVehicleDirectory};
pub use sqlite::{SqlRequestStore, SqlVehicleDirectory};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("request `{0}` already exists")]
    DuplicateRequest(RequestId),
    #[error("request `{id}` was modified concurrently (expected revision {expected_revision})")]
    RevisionConflict { id: RequestId, expected_revision: i64 },
}

/// Durable key-document store for requests. Each request is one document:
/// the audit history travels inside it, so a read or write always covers
/// the request and its full trail together.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, request: Request) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, StoreError>;

    /// Guarded write: commits only while the stored revision still equals
    /// `expected_revision`, otherwise `StoreError::RevisionConflict`.
    async fn update(&self, request: Request, expected_revision: i64) -> Result<(), StoreError>;

    /// All requests, most recently created first.
    async fn list_all(&self) -> Result<Vec<Request>, StoreError>;

    /// Requests in parallel review whose Regional Head flag is still unset,
    /// oldest first. Feeds batch approval.
    async fn list_awaiting_rh(&self) -> Result<Vec<Request>, StoreError>;
}

/// Registry of known vehicles; request-type derivation asks it whether every
/// vehicle on a submission is pre-registered.
#[async_trait]
pub trait VehicleDirectory: Send + Sync {
    async fn find_by_number(&self, vehicle_number: &str) -> Result<Option<Vehicle>, StoreError>;

    async fn is_registered(&self, vehicle_number: &str) -> Result<bool, StoreError>;

    async fn save(&self, vehicle: Vehicle) -> Result<(), StoreError>;
}
