//! Controlador del flujo de solicitudes
//!
//! PENDING → APPROVED | REJECTED, ambos terminales. La aprobación viaja en el
//! mismo lote que la asignación del vehículo: o se confirman las dos o
//! ninguna, y la solicitud sigue PENDING.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::field_map;
use super::lifecycle_controller::LifecycleController;
use crate::gateway::{Collection, DocumentStore, Precondition, WriteOp};
use crate::models::{RequestStatus, VehicleRequest, VehicleStatus};
use crate::repositories::{RequestRepository, VehicleRepository};
use crate::services::auth_service::Session;
use crate::utils::clock::Clock;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::timestamp;

/// Resultado de una resolución confirmada
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub request_id: String,
    pub vehicle_id: String,
    pub status: RequestStatus,
    pub responded_by: String,
    #[serde(with = "timestamp")]
    pub responded_at: DateTime<Utc>,
}

pub struct RequestController {
    store: Arc<dyn DocumentStore>,
    requests: RequestRepository,
    vehicles: VehicleRepository,
    lifecycle: Arc<LifecycleController>,
    clock: Arc<dyn Clock>,
}

impl RequestController {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        lifecycle: Arc<LifecycleController>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            requests: RequestRepository::new(store.clone()),
            vehicles: VehicleRepository::new(store.clone()),
            store,
            lifecycle,
            clock,
        }
    }

    /// Crear solicitud PENDING (acción de conductor)
    pub async fn create_request(
        &self,
        session: &Session,
        vehicle_id: &str,
        destination: &str,
        reason: &str,
    ) -> Result<VehicleRequest, AppError> {
        session.require_driver("request vehicle")?;

        let destination = destination.trim();
        if destination.is_empty() {
            return Err(AppError::BadRequest("Destination is required".to_string()));
        }

        // Verificación orientativa; la aprobación vuelve a comprobarlo
        let vehicle = self.vehicles.get(vehicle_id).await?;
        if vehicle.status != VehicleStatus::Available {
            return Err(conflict_error(
                "Vehicle",
                vehicle_id,
                &format!("is {}, only AVAILABLE vehicles can be requested", vehicle.status),
            ));
        }

        let now = self.clock.now();
        let id = self
            .store
            .create(
                Collection::VehicleRequests,
                None,
                json!({
                    "vehicleId": vehicle_id,
                    "driverId": session.uid,
                    "driverName": session.name,
                    "destination": destination,
                    "reason": reason.trim(),
                    "status": RequestStatus::Pending.as_str(),
                    "requestedAt": timestamp::format(&now),
                    "respondedAt": null,
                    "respondedBy": null,
                }),
            )
            .await?;

        tracing::info!(
            "📝 Solicitud {} creada por {} para vehículo {}",
            id,
            session.uid,
            vehicle_id
        );

        Ok(VehicleRequest {
            id,
            vehicle_id: vehicle_id.to_string(),
            driver_id: session.uid.clone(),
            driver_name: session.name.clone(),
            destination: destination.to_string(),
            reason: reason.trim().to_string(),
            status: RequestStatus::Pending,
            requested_at: now,
            responded_at: None,
            responded_by: None,
        })
    }

    /// Aprobar: asignación + resolución en un solo lote atómico
    pub async fn approve_request(
        &self,
        session: &Session,
        request_id: &str,
    ) -> Result<RequestOutcome, AppError> {
        session.require_master("approve request")?;

        let request = self.pending_request(request_id).await?;
        let now = self.clock.now();

        let mut ops = self
            .lifecycle
            .prepare_assignment(&request.vehicle_id, &request.driver_id, &request.destination, now)
            .await?;
        ops.push(resolution_op(&request.id, RequestStatus::Approved, &session.uid, now));

        self.store.commit(ops).await?;

        tracing::info!(
            "✅ Solicitud {} aprobada por {}: vehículo {} asignado a {}",
            request.id,
            session.uid,
            request.vehicle_id,
            request.driver_name
        );

        Ok(RequestOutcome {
            request_id: request.id,
            vehicle_id: request.vehicle_id,
            status: RequestStatus::Approved,
            responded_by: session.uid.clone(),
            responded_at: now,
        })
    }

    /// Rechazar sin otros efectos
    pub async fn reject_request(
        &self,
        session: &Session,
        request_id: &str,
    ) -> Result<RequestOutcome, AppError> {
        session.require_master("reject request")?;

        let request = self.pending_request(request_id).await?;
        let now = self.clock.now();

        self.store
            .commit(vec![resolution_op(
                &request.id,
                RequestStatus::Rejected,
                &session.uid,
                now,
            )])
            .await?;

        tracing::info!("❎ Solicitud {} rechazada por {}", request.id, session.uid);

        Ok(RequestOutcome {
            request_id: request.id,
            vehicle_id: request.vehicle_id,
            status: RequestStatus::Rejected,
            responded_by: session.uid.clone(),
            responded_at: now,
        })
    }

    /// Masters ven todas; conductores solo las propias
    pub async fn list_requests(
        &self,
        session: &Session,
        status: Option<RequestStatus>,
    ) -> Result<Vec<VehicleRequest>, AppError> {
        let requests = self.requests.list(status).await?;
        if session.is_master() {
            return Ok(requests);
        }
        Ok(requests
            .into_iter()
            .filter(|r| r.driver_id == session.uid)
            .collect())
    }

    async fn pending_request(&self, request_id: &str) -> Result<VehicleRequest, AppError> {
        let request = self.requests.get(request_id).await?;
        if request.status.is_terminal() {
            return Err(conflict_error(
                "Vehicle request",
                request_id,
                &format!("already {}", request.status),
            ));
        }
        Ok(request)
    }
}

fn resolution_op(
    request_id: &str,
    status: RequestStatus,
    responded_by: &str,
    now: DateTime<Utc>,
) -> WriteOp {
    WriteOp::Update {
        collection: Collection::VehicleRequests,
        id: request_id.to_string(),
        fields: field_map([
            ("status", json!(status.as_str())),
            ("respondedAt", timestamp::to_value(&now)),
            ("respondedBy", json!(responded_by)),
        ]),
        preconditions: vec![Precondition::field_equals(
            "status",
            RequestStatus::Pending.as_str(),
        )],
    }
}
