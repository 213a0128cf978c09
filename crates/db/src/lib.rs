pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod store;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed, seed_vehicles, SeedResult};
pub use store::{
    InMemoryRequestStore, InMemoryVehicleDirectory, RequestStore, SqlRequestStore,
    SqlVehicleDirectory, StoreError, VehicleDirectory,
};
