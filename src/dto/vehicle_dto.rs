use serde::Deserialize;
use validator::Validate;

use crate::services::fleet_projection::StatusFilter;

// Request para asignar un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehicleRequest {
    #[validate(length(min = 1, max = 128))]
    pub driver_id: String,
    #[validate(length(min = 1, max = 200))]
    pub destination: String,
}

// Filtros para listados de vehículos
#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    #[serde(default)]
    pub status: StatusFilter,
    pub limit: Option<usize>,
}

// Paginación del historial
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}
