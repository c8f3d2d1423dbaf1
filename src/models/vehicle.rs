//! Modelo de Vehicle
//!
//! Documento de larga vida en la colección `vehicles`, mutado en cada ciclo
//! de viaje: AVAILABLE → ASSIGNED → IN_TRANSIT → RETURNING → AVAILABLE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::timestamp;

/// Estado del ciclo de vida del vehículo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    Assigned,
    InTransit,
    Returning,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 4] = [
        VehicleStatus::Available,
        VehicleStatus::Assigned,
        VehicleStatus::InTransit,
        VehicleStatus::Returning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Assigned => "ASSIGNED",
            VehicleStatus::InTransit => "IN_TRANSIT",
            VehicleStatus::Returning => "RETURNING",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(VehicleStatus::Available),
            "ASSIGNED" => Some(VehicleStatus::Assigned),
            "IN_TRANSIT" => Some(VehicleStatus::InTransit),
            "RETURNING" => Some(VehicleStatus::Returning),
            _ => None,
        }
    }

    /// Etiqueta para mostrar al usuario
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::Assigned => "Assigned",
            VehicleStatus::InTransit => "In Transit",
            VehicleStatus::Returning => "Returning",
        }
    }

    /// Estado siguiente en el ciclo
    pub fn next(&self) -> VehicleStatus {
        match self {
            VehicleStatus::Available => VehicleStatus::Assigned,
            VehicleStatus::Assigned => VehicleStatus::InTransit,
            VehicleStatus::InTransit => VehicleStatus::Returning,
            VehicleStatus::Returning => VehicleStatus::Available,
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTimestamps {
    #[serde(default, with = "timestamp::option")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub reached_destination_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub returned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub driver_name: Option<String>,
    pub status: VehicleStatus,
    pub current_location: String,
    #[serde(default)]
    pub destination: Option<String>,
    pub warehouse: String,
    #[serde(default)]
    pub timestamps: VehicleTimestamps,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// AVAILABLE sin conductor, o con conductor en cualquier otro estado
    pub fn is_consistent(&self) -> bool {
        match self.status {
            VehicleStatus::Available => self.driver_id.is_none(),
            _ => self.driver_id.is_some(),
        }
    }

    pub fn is_assigned_to(&self, driver_id: &str) -> bool {
        self.driver_id.as_deref() == Some(driver_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trips_wire_names() {
        for status in VehicleStatus::ALL {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, json!(status.as_str()));
            assert_eq!(VehicleStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(VehicleStatus::Returning.next(), VehicleStatus::Available);
    }

    #[test]
    fn missing_timestamps_default_to_none() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "id": "V1",
            "status": "AVAILABLE",
            "currentLocation": "Warehouse A",
            "warehouse": "Warehouse A",
            "createdAt": "2025-01-01T08:00:00.000Z",
            "updatedAt": "2025-01-01T08:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(vehicle.timestamps, VehicleTimestamps::default());
        assert!(vehicle.is_consistent());
    }
}
