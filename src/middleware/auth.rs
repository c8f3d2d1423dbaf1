//! Autenticación de requests
//!
//! Extrae el token Bearer, lo verifica y resuelve la sesión activa. La sesión
//! se inyecta como argumento del handler; no existe un "usuario actual"
//! global.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    services::auth_service::Session,
    state::AppState,
    utils::{errors::AppError, jwt::extract_token_from_header},
};

/// Sesión autenticada que reciben los handlers
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

        let token = extract_token_from_header(auth_header)?;
        let session = state.auth.current_session(token).await?;
        Ok(AuthSession(session))
    }
}
