use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Driver;
use crate::services::auth_service::Session;

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub password: String,
}

// Perfil de la sesión actual
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub session: Session,
    pub driver: Driver,
}
