//! Capa de proyección
//!
//! Funciones puras sobre snapshots confirmados: estadísticas del dashboard,
//! filtros de flota y timeline de un viaje con tiempos estimados.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{
    DashboardStats, RequestStatus, StepStatus, TimeEstimate, Timeline, TimelineStep, Vehicle,
    VehicleRequest, VehicleStatus,
};

/// Presupuesto estimado del tramo de ida
pub const OUTBOUND_BUDGET_MINUTES: i64 = 30;
/// Presupuesto estimado del tramo de regreso
pub const RETURN_BUDGET_MINUTES: i64 = 25;
/// Nunca se muestra menos que esto
pub const MIN_ESTIMATE_MINUTES: i64 = 5;

/// Filtro de estado para listados (`ALL` o un estado)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    Available,
    Assigned,
    InTransit,
    Returning,
}

impl StatusFilter {
    pub fn status(&self) -> Option<VehicleStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Available => Some(VehicleStatus::Available),
            StatusFilter::Assigned => Some(VehicleStatus::Assigned),
            StatusFilter::InTransit => Some(VehicleStatus::InTransit),
            StatusFilter::Returning => Some(VehicleStatus::Returning),
        }
    }
}

pub fn dashboard_stats(vehicles: &[Vehicle], requests: &[VehicleRequest]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_vehicles: vehicles.len(),
        pending_requests: requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count(),
        ..DashboardStats::default()
    };

    for vehicle in vehicles {
        match vehicle.status {
            VehicleStatus::Available => stats.available += 1,
            VehicleStatus::Assigned => stats.assigned += 1,
            VehicleStatus::InTransit => stats.in_transit += 1,
            VehicleStatus::Returning => stats.returning += 1,
        }
    }
    stats
}

pub fn filter_vehicles(vehicles: &[Vehicle], filter: StatusFilter) -> Vec<Vehicle> {
    match filter.status() {
        None => vehicles.to_vec(),
        Some(status) => vehicles
            .iter()
            .filter(|v| v.status == status)
            .cloned()
            .collect(),
    }
}

fn estimate(budget: i64, since: DateTime<Utc>, now: DateTime<Utc>) -> TimeEstimate {
    let elapsed = (now - since).num_minutes();
    TimeEstimate {
        minutes_left: (budget - elapsed).max(MIN_ESTIMATE_MINUTES),
        estimated: true,
    }
}

/// Timeline de tres pasos: salida, destino, regreso
pub fn timeline(vehicle: &Vehicle, now: DateTime<Utc>) -> Timeline {
    let ts = &vehicle.timestamps;

    let start = TimelineStep {
        label: "Start",
        location: vehicle.warehouse.clone(),
        timestamp: ts.started_at,
        status: if ts.started_at.is_some() {
            StepStatus::Completed
        } else {
            StepStatus::Pending
        },
        time_left: None,
    };

    let mut destination = TimelineStep {
        label: "Destination",
        location: vehicle
            .destination
            .clone()
            .unwrap_or_else(|| "Not set".to_string()),
        timestamp: ts.reached_destination_at,
        status: StepStatus::Pending,
        time_left: None,
    };
    match vehicle.status {
        VehicleStatus::InTransit => {
            destination.status = StepStatus::Active;
            if let (Some(started), None) = (ts.started_at, ts.reached_destination_at) {
                destination.time_left = Some(estimate(OUTBOUND_BUDGET_MINUTES, started, now));
            }
        }
        VehicleStatus::Returning | VehicleStatus::Available => {
            destination.status = StepStatus::Completed;
        }
        VehicleStatus::Assigned => {}
    }

    let mut back = TimelineStep {
        label: "Return",
        location: vehicle.warehouse.clone(),
        timestamp: ts.returned_at,
        status: StepStatus::Pending,
        time_left: None,
    };
    match vehicle.status {
        VehicleStatus::Returning => {
            back.status = StepStatus::Active;
            if let (Some(reached), None) = (ts.reached_destination_at, ts.returned_at) {
                back.time_left = Some(estimate(RETURN_BUDGET_MINUTES, reached, now));
            }
        }
        VehicleStatus::Available => back.status = StepStatus::Completed,
        _ => {}
    }

    Timeline {
        vehicle_id: vehicle.id.clone(),
        status: vehicle.status,
        status_label: vehicle.status.label(),
        steps: vec![start, destination, back],
    }
}
