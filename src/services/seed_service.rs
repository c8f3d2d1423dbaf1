//! Carga de datos iniciales
//!
//! Pensado para el almacén en memoria: crea perfiles, credenciales y vehículos
//! a partir de un archivo JSON.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::gateway::{Collection, DocumentStore, LocalAuthProvider};
use crate::models::{DriverRole, VehicleStatus};
use crate::utils::errors::AppError;
use crate::utils::timestamp;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDriver {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    pub role: DriverRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub password: String,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedVehicle {
    pub id: String,
    pub warehouse: String,
    #[serde(default)]
    pub current_location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub drivers: Vec<SeedDriver>,
    #[serde(default)]
    pub vehicles: Vec<SeedVehicle>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub drivers: usize,
    pub vehicles: usize,
}

pub async fn load_seed_file(path: &Path) -> Result<SeedData, AppError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Internal(format!("No se pudo leer {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::BadRequest(format!("Seed inválido en {}: {}", path.display(), e)))
}

pub async fn apply_seed(
    store: Arc<dyn DocumentStore>,
    auth: &LocalAuthProvider,
    seed: SeedData,
    now: DateTime<Utc>,
) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();
    let now = timestamp::format(&now);

    for driver in seed.drivers {
        store
            .create(
                Collection::Users,
                Some(driver.id.clone()),
                json!({
                    "name": driver.name,
                    "phone": driver.phone,
                    "email": driver.email,
                    "role": driver.role,
                    "isActive": driver.is_active,
                    "currentVehicleId": null,
                    "fcmToken": null,
                    "createdAt": now,
                    "updatedAt": now,
                }),
            )
            .await?;
        auth.register(&driver.id, &driver.email, &driver.password).await?;
        report.drivers += 1;
    }

    for vehicle in seed.vehicles {
        let location = vehicle
            .current_location
            .unwrap_or_else(|| vehicle.warehouse.clone());
        store
            .create(
                Collection::Vehicles,
                Some(vehicle.id.clone()),
                json!({
                    "driverId": null,
                    "driverName": null,
                    "status": VehicleStatus::Available,
                    "currentLocation": location,
                    "destination": null,
                    "warehouse": vehicle.warehouse,
                    "timestamps": {
                        "assignedAt": null,
                        "startedAt": null,
                        "reachedDestinationAt": null,
                        "returnedAt": null,
                    },
                    "createdAt": now,
                    "updatedAt": now,
                }),
            )
            .await?;
        report.vehicles += 1;
    }

    tracing::info!(
        "🌱 Seed aplicado: {} usuarios, {} vehículos",
        report.drivers,
        report.vehicles
    );
    Ok(report)
}
