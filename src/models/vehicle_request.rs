//! Modelo de VehicleRequest
//!
//! Solicitud de un conductor para usar un vehículo. Se crea PENDING y se
//! resuelve exactamente una vez.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(RequestStatus::Pending),
            "APPROVED" => Some(RequestStatus::Approved),
            "REJECTED" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    pub id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub driver_name: String,
    pub destination: String,
    pub reason: String,
    pub status: RequestStatus,
    #[serde(with = "timestamp")]
    pub requested_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responded_by: Option<String>,
}
