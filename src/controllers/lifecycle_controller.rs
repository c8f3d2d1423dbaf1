//! Controlador del ciclo de vida del vehículo
//!
//! AVAILABLE → ASSIGNED → IN_TRANSIT → RETURNING → AVAILABLE. Cada transición
//! es un único lote de escrituras condicionadas al estado previo; si otro actor
//! cambió el documento entre la lectura y la escritura, el lote entero se
//! rechaza con `StateConflict`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::field_map;
use crate::gateway::{Collection, DocumentStore, Precondition, WriteOp};
use crate::models::trip_history::trip_duration_minutes;
use crate::models::{Driver, DriverRole, Vehicle, VehicleStatus};
use crate::repositories::{DriverRepository, VehicleRepository};
use crate::services::auth_service::Session;
use crate::utils::clock::Clock;
use crate::utils::errors::{conflict_error, forbidden_error, AppError};
use crate::utils::timestamp;

/// Resultado de una transición confirmada por el almacén
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub vehicle_id: String,
    pub from: VehicleStatus,
    pub to: VehicleStatus,
    #[serde(with = "timestamp")]
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

pub struct LifecycleController {
    store: Arc<dyn DocumentStore>,
    vehicles: VehicleRepository,
    drivers: DriverRepository,
    clock: Arc<dyn Clock>,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            vehicles: VehicleRepository::new(store.clone()),
            drivers: DriverRepository::new(store.clone()),
            store,
            clock,
        }
    }

    /// AVAILABLE → ASSIGNED (acción de master)
    pub async fn assign_vehicle(
        &self,
        session: &Session,
        vehicle_id: &str,
        driver_id: &str,
        destination: &str,
    ) -> Result<TransitionOutcome, AppError> {
        session.require_master("assign vehicle")?;

        let now = self.clock.now();
        let ops = self.prepare_assignment(vehicle_id, driver_id, destination, now).await?;
        self.store.commit(ops).await?;

        tracing::info!(
            "🚗 Vehículo {} asignado a {} por {} (destino: {})",
            vehicle_id,
            driver_id,
            session.uid,
            destination.trim()
        );

        Ok(TransitionOutcome {
            vehicle_id: vehicle_id.to_string(),
            from: VehicleStatus::Available,
            to: VehicleStatus::Assigned,
            at: now,
            trip_id: None,
            duration_minutes: None,
        })
    }

    /// Escrituras de una asignación, listas para incluir en un lote mayor
    pub(crate) async fn prepare_assignment(
        &self,
        vehicle_id: &str,
        driver_id: &str,
        destination: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<WriteOp>, AppError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(AppError::BadRequest("Destination is required".to_string()));
        }

        let vehicle = self.vehicles.get(vehicle_id).await?;
        let driver = self.drivers.get(driver_id).await?;

        check_assignable(&vehicle, &driver)?;
        Ok(assignment_ops(&vehicle, &driver, destination, now))
    }

    /// ASSIGNED → IN_TRANSIT (conductor asignado)
    pub async fn start_trip(
        &self,
        session: &Session,
        vehicle_id: &str,
    ) -> Result<TransitionOutcome, AppError> {
        let vehicle = self.vehicles.get(vehicle_id).await?;
        let now = self.clock.now();

        self.driver_transition(
            session,
            &vehicle,
            VehicleStatus::Assigned,
            "timestamps.startedAt",
            now,
        )
        .await?;

        tracing::info!("🛣️ Viaje iniciado: vehículo {} por {}", vehicle_id, session.uid);
        Ok(TransitionOutcome {
            vehicle_id: vehicle_id.to_string(),
            from: VehicleStatus::Assigned,
            to: VehicleStatus::InTransit,
            at: now,
            trip_id: None,
            duration_minutes: None,
        })
    }

    /// IN_TRANSIT → RETURNING; marca la llegada a destino
    pub async fn start_return(
        &self,
        session: &Session,
        vehicle_id: &str,
    ) -> Result<TransitionOutcome, AppError> {
        let vehicle = self.vehicles.get(vehicle_id).await?;
        let now = self.clock.now();

        self.driver_transition(
            session,
            &vehicle,
            VehicleStatus::InTransit,
            "timestamps.reachedDestinationAt",
            now,
        )
        .await?;

        tracing::info!("↩️ Regreso iniciado: vehículo {} por {}", vehicle_id, session.uid);
        Ok(TransitionOutcome {
            vehicle_id: vehicle_id.to_string(),
            from: VehicleStatus::InTransit,
            to: VehicleStatus::Returning,
            at: now,
            trip_id: None,
            duration_minutes: None,
        })
    }

    /// RETURNING → AVAILABLE; libera conductor y registra el viaje
    pub async fn complete_trip(
        &self,
        session: &Session,
        vehicle_id: &str,
    ) -> Result<TransitionOutcome, AppError> {
        let (vehicle, version) = self.vehicles.get_versioned(vehicle_id).await?;

        if vehicle.status != VehicleStatus::Returning {
            return Err(conflict_error(
                "Vehicle",
                vehicle_id,
                &format!("is {}, expected {}", vehicle.status, VehicleStatus::Returning),
            ));
        }
        let Some(driver_id) = vehicle.driver_id.clone() else {
            return Err(conflict_error("Vehicle", vehicle_id, "has no assigned driver"));
        };
        if !session.is_master() && session.uid != driver_id {
            return Err(forbidden_error("complete trip", "vehicle is assigned to another driver"));
        }

        let now = self.clock.now();
        let mut ops = vec![WriteOp::Update {
            collection: Collection::Vehicles,
            id: vehicle.id.clone(),
            fields: field_map([
                ("status", json!(VehicleStatus::Available.as_str())),
                ("driverId", Value::Null),
                ("driverName", Value::Null),
                ("destination", Value::Null),
                ("timestamps.assignedAt", Value::Null),
                ("timestamps.startedAt", Value::Null),
                ("timestamps.reachedDestinationAt", Value::Null),
                ("timestamps.returnedAt", timestamp::to_value(&now)),
                ("updatedAt", timestamp::to_value(&now)),
            ]),
            preconditions: vec![
                Precondition::field_equals("status", VehicleStatus::Returning.as_str()),
                Precondition::field_equals("driverId", driver_id.as_str()),
                Precondition::Version(version),
            ],
        }];

        if self.drivers.find_by_id(&driver_id).await?.is_some() {
            ops.push(WriteOp::Update {
                collection: Collection::Users,
                id: driver_id.clone(),
                fields: field_map([
                    ("currentVehicleId", Value::Null),
                    ("updatedAt", timestamp::to_value(&now)),
                ]),
                preconditions: Vec::new(),
            });
        } else {
            tracing::warn!("⚠️ Perfil de conductor {} no encontrado al completar viaje", driver_id);
        }

        let mut trip_id = None;
        let mut duration = None;
        match (vehicle.timestamps.started_at, vehicle.destination.as_deref()) {
            (Some(started_at), Some(destination)) => {
                let minutes = trip_duration_minutes(started_at, now);
                let id = Uuid::new_v4().to_string();
                ops.push(WriteOp::Create {
                    collection: Collection::TripHistory,
                    id: Some(id.clone()),
                    data: json!({
                        "vehicleId": vehicle.id,
                        "driverId": driver_id,
                        "driverName": vehicle.driver_name.clone().unwrap_or_default(),
                        "startLocation": vehicle.current_location,
                        "destination": destination,
                        "startTime": timestamp::format(&started_at),
                        "endTime": timestamp::format(&now),
                        "duration": minutes,
                        "createdAt": timestamp::format(&now),
                    }),
                });
                trip_id = Some(id);
                duration = Some(minutes);
            }
            _ => tracing::warn!(
                "⚠️ Vehículo {} sin startedAt/destino, no se registra historial",
                vehicle_id
            ),
        }

        self.store.commit(ops).await?;

        tracing::info!(
            "🏁 Viaje completado: vehículo {} ({} min)",
            vehicle_id,
            duration.unwrap_or_default()
        );

        Ok(TransitionOutcome {
            vehicle_id: vehicle_id.to_string(),
            from: VehicleStatus::Returning,
            to: VehicleStatus::Available,
            at: now,
            trip_id,
            duration_minutes: duration,
        })
    }

    /// Transición ejecutada por el conductor asignado que sella un timestamp
    async fn driver_transition(
        &self,
        session: &Session,
        vehicle: &Vehicle,
        from: VehicleStatus,
        timestamp_field: &'static str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let to = from.next();
        if vehicle.status != from {
            return Err(conflict_error(
                "Vehicle",
                &vehicle.id,
                &format!("is {}, expected {}", vehicle.status, from),
            ));
        }
        if !vehicle.is_assigned_to(&session.uid) {
            return Err(forbidden_error(
                &format!("move vehicle to {}", to),
                "vehicle is not assigned to you",
            ));
        }

        let op = WriteOp::Update {
            collection: Collection::Vehicles,
            id: vehicle.id.clone(),
            fields: field_map([
                ("status", json!(to.as_str())),
                (timestamp_field, timestamp::to_value(&now)),
                ("updatedAt", timestamp::to_value(&now)),
            ]),
            preconditions: vec![
                Precondition::field_equals("status", from.as_str()),
                Precondition::field_equals("driverId", session.uid.as_str()),
            ],
        };

        self.store.commit(vec![op]).await?;
        Ok(())
    }
}

/// Precondiciones legibles antes de construir el lote
fn check_assignable(vehicle: &Vehicle, driver: &Driver) -> Result<(), AppError> {
    if vehicle.status != VehicleStatus::Available || vehicle.driver_id.is_some() {
        return Err(conflict_error(
            "Vehicle",
            &vehicle.id,
            &format!("is {}, expected {}", vehicle.status, VehicleStatus::Available),
        ));
    }
    if driver.role != Some(DriverRole::Driver) {
        return Err(AppError::BadRequest(format!(
            "User '{}' is not a driver",
            driver.id
        )));
    }
    if !driver.is_active {
        return Err(AppError::BadRequest(format!(
            "Driver '{}' account is inactive",
            driver.id
        )));
    }
    if let Some(current) = &driver.current_vehicle_id {
        return Err(conflict_error(
            "Driver",
            &driver.id,
            &format!("already has vehicle '{}'", current),
        ));
    }
    Ok(())
}

/// Vehículo y conductor se enlazan en el mismo lote
fn assignment_ops(
    vehicle: &Vehicle,
    driver: &Driver,
    destination: &str,
    now: DateTime<Utc>,
) -> Vec<WriteOp> {
    vec![
        WriteOp::Update {
            collection: Collection::Vehicles,
            id: vehicle.id.clone(),
            fields: field_map([
                ("status", json!(VehicleStatus::Assigned.as_str())),
                ("driverId", json!(driver.id)),
                ("driverName", json!(driver.name)),
                ("destination", json!(destination)),
                ("timestamps.assignedAt", timestamp::to_value(&now)),
                ("timestamps.startedAt", Value::Null),
                ("timestamps.reachedDestinationAt", Value::Null),
                ("timestamps.returnedAt", Value::Null),
                ("updatedAt", timestamp::to_value(&now)),
            ]),
            preconditions: vec![
                Precondition::field_equals("status", VehicleStatus::Available.as_str()),
                Precondition::field_is_null("driverId"),
            ],
        },
        WriteOp::Update {
            collection: Collection::Users,
            id: driver.id.clone(),
            fields: field_map([
                ("currentVehicleId", json!(vehicle.id)),
                ("updatedAt", timestamp::to_value(&now)),
            ]),
            preconditions: vec![Precondition::field_is_null("currentVehicleId")],
        },
    ]
}
