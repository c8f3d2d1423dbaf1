//! Modelo de Driver
//!
//! Perfil de usuario en la colección `users`. El rol decide qué operaciones
//! puede ejecutar la sesión.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::timestamp;

/// Rol del usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverRole {
    Driver,
    VehicleMaster,
}

impl DriverRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverRole::Driver => "DRIVER",
            DriverRole::VehicleMaster => "VEHICLE_MASTER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRIVER" => Some(DriverRole::Driver),
            "VEHICLE_MASTER" => Some(DriverRole::VehicleMaster),
            _ => None,
        }
    }
}

impl fmt::Display for DriverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Perfiles antiguos pueden no tener rol; el login los rechaza
    pub role: Option<DriverRole>,
    pub is_active: bool,
    #[serde(default)]
    pub current_vehicle_id: Option<String>,
    #[serde(default)]
    pub fcm_token: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Conductor activo sin vehículo asignado
    pub fn is_available(&self) -> bool {
        self.is_active && self.role == Some(DriverRole::Driver) && self.current_vehicle_id.is_none()
    }
}
