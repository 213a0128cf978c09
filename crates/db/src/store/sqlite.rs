use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use gpsflow_core::audit::AuditEntry;
use gpsflow_core::domain::request::{
    DriverDetail, Request, RequestId, RequestStatus, RequestType, VehicleRef,
};
use gpsflow_core::domain::vehicle::Vehicle;

use super::{RequestStore, StoreError, VehicleDirectory};
use crate::DbPool;

pub struct SqlRequestStore {
    pool: DbPool,
}

impl SqlRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const REQUEST_COLUMNS: &str = "id, city, client_name, request_type, status, rh_approval, \
     payment_approval, vendor_name, rejection_reason, notification_timestamp, created_by, \
     created_at, updated_at, revision, vehicles, driver_details, history";

fn decode<T: serde::de::DeserializeOwned>(raw: &str, column: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Decode(format!("{column}: {e}")))
}

fn parse_timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Decode(format!("{column}: {e}")))
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<Request, StoreError> {
    let get_text = |column: &str| -> Result<String, StoreError> {
        row.try_get(column).map_err(|e| StoreError::Decode(e.to_string()))
    };
    let get_opt_text = |column: &str| -> Result<Option<String>, StoreError> {
        row.try_get(column).map_err(|e| StoreError::Decode(e.to_string()))
    };

    let status = get_text("status")?
        .parse::<RequestStatus>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let request_type = get_text("request_type")?
        .parse::<RequestType>()
        .map_err(|e| StoreError::Decode(e.to_string()))?;

    let vehicles: Vec<VehicleRef> = decode(&get_text("vehicles")?, "vehicles")?;
    let driver_details: Vec<DriverDetail> = decode(&get_text("driver_details")?, "driver_details")?;
    let history: Vec<AuditEntry> = decode(&get_text("history")?, "history")?;

    let notification_timestamp = get_opt_text("notification_timestamp")?
        .map(|raw| parse_timestamp(&raw, "notification_timestamp"))
        .transpose()?;

    Ok(Request {
        id: RequestId(get_text("id")?),
        vehicles,
        city: get_text("city")?,
        client_name: get_text("client_name")?,
        driver_details,
        request_type,
        status,
        rh_approval: row.try_get("rh_approval").map_err(|e| StoreError::Decode(e.to_string()))?,
        payment_approval: row
            .try_get("payment_approval")
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        vendor_name: get_opt_text("vendor_name")?,
        rejection_reason: get_opt_text("rejection_reason")?,
        notification_timestamp,
        created_by: get_text("created_by")?,
        created_at: parse_timestamp(&get_text("created_at")?, "created_at")?,
        updated_at: parse_timestamp(&get_text("updated_at")?, "updated_at")?,
        revision: row.try_get("revision").map_err(|e| StoreError::Decode(e.to_string()))?,
        history,
    })
}

fn encode_document(
    request: &Request,
) -> Result<(String, String, String), StoreError> {
    let vehicles = serde_json::to_string(&request.vehicles)
        .map_err(|e| StoreError::Decode(format!("vehicles: {e}")))?;
    let driver_details = serde_json::to_string(&request.driver_details)
        .map_err(|e| StoreError::Decode(format!("driver_details: {e}")))?;
    let history = serde_json::to_string(&request.history)
        .map_err(|e| StoreError::Decode(format!("history: {e}")))?;
    Ok((vehicles, driver_details, history))
}

#[async_trait]
impl RequestStore for SqlRequestStore {
    async fn insert(&self, request: Request) -> Result<(), StoreError> {
        let (vehicles, driver_details, history) = encode_document(&request)?;

        let result = sqlx::query(
            "INSERT INTO request (id, city, client_name, request_type, status, rh_approval,
                                  payment_approval, vendor_name, rejection_reason,
                                  notification_timestamp, created_by, created_at, updated_at,
                                  revision, vehicles, driver_details, history)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id.0)
        .bind(&request.city)
        .bind(&request.client_name)
        .bind(request.request_type.as_str())
        .bind(request.status.as_str())
        .bind(request.rh_approval)
        .bind(request.payment_approval)
        .bind(&request.vendor_name)
        .bind(&request.rejection_reason)
        .bind(request.notification_timestamp.map(|dt| dt.to_rfc3339()))
        .bind(&request.created_by)
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
        .bind(request.revision)
        .bind(vehicles)
        .bind(driver_details)
        .bind(history)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error)
                if error
                    .as_database_error()
                    .is_some_and(|db_error| db_error.is_unique_violation()) =>
            {
                Err(StoreError::DuplicateRequest(request.id.clone()))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, StoreError> {
        let row =
            sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM request WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, request: Request, expected_revision: i64) -> Result<(), StoreError> {
        let (vehicles, driver_details, history) = encode_document(&request)?;

        let result = sqlx::query(
            "UPDATE request SET
                 city = ?, client_name = ?, request_type = ?, status = ?, rh_approval = ?,
                 payment_approval = ?, vendor_name = ?, rejection_reason = ?,
                 notification_timestamp = ?, created_by = ?, created_at = ?, updated_at = ?,
                 revision = ?, vehicles = ?, driver_details = ?, history = ?
             WHERE id = ? AND revision = ?",
        )
        .bind(&request.city)
        .bind(&request.client_name)
        .bind(request.request_type.as_str())
        .bind(request.status.as_str())
        .bind(request.rh_approval)
        .bind(request.payment_approval)
        .bind(&request.vendor_name)
        .bind(&request.rejection_reason)
        .bind(request.notification_timestamp.map(|dt| dt.to_rfc3339()))
        .bind(&request.created_by)
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
        .bind(request.revision)
        .bind(vehicles)
        .bind(driver_details)
        .bind(history)
        .bind(&request.id.0)
        .bind(expected_revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RevisionConflict { id: request.id, expected_revision });
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Request>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM request ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_request).collect()
    }

    async fn list_awaiting_rh(&self) -> Result<Vec<Request>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM request
             WHERE status = 'PARALLEL_REVIEW' AND rh_approval = 0
             ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_request).collect()
    }
}

pub struct SqlVehicleDirectory {
    pool: DbPool,
}

impl SqlVehicleDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_vehicle(row: &sqlx::sqlite::SqliteRow) -> Result<Vehicle, StoreError> {
    Ok(Vehicle {
        id: row.try_get("id").map_err(|e| StoreError::Decode(e.to_string()))?,
        vehicle_number: row
            .try_get("vehicle_number")
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        client_name: row.try_get("client_name").map_err(|e| StoreError::Decode(e.to_string()))?,
        city: row.try_get("city").map_err(|e| StoreError::Decode(e.to_string()))?,
        is_registered: row
            .try_get("is_registered")
            .map_err(|e| StoreError::Decode(e.to_string()))?,
    })
}

#[async_trait]
impl VehicleDirectory for SqlVehicleDirectory {
    async fn find_by_number(&self, vehicle_number: &str) -> Result<Option<Vehicle>, StoreError> {
        let row = sqlx::query(
            "SELECT id, vehicle_number, client_name, city, is_registered
             FROM vehicle WHERE vehicle_number = ? COLLATE NOCASE",
        )
        .bind(vehicle_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_vehicle(r)?)),
            None => Ok(None),
        }
    }

    async fn is_registered(&self, vehicle_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .find_by_number(vehicle_number)
            .await?
            .map(|vehicle| vehicle.is_registered)
            .unwrap_or(false))
    }

    async fn save(&self, vehicle: Vehicle) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO vehicle (id, vehicle_number, client_name, city, is_registered)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 vehicle_number = excluded.vehicle_number,
                 client_name = excluded.client_name,
                 city = excluded.city,
                 is_registered = excluded.is_registered",
        )
        .bind(&vehicle.id)
        .bind(&vehicle.vehicle_number)
        .bind(&vehicle.client_name)
        .bind(&vehicle.city)
        .bind(vehicle.is_registered)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
