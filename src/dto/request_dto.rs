use serde::Deserialize;
use validator::Validate;

use crate::models::RequestStatus;

// Request de un conductor para usar un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequestBody {
    #[validate(length(min = 1, max = 128))]
    pub vehicle_id: String,
    #[validate(length(min = 1, max = 200))]
    pub destination: String,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub reason: String,
}

// Filtro por estado de solicitud
#[derive(Debug, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<RequestStatus>,
}
