//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::{AuthError, StoreError};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// La precondición de una transición ya no se cumple
    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthenticationFailure(_) => "AUTH_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StateConflict(_) => "STATE_CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::TransientNetwork(_) => "NETWORK_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailure(_) | AppError::Unauthorized(_) | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StateConflict(_) => StatusCode::CONFLICT,
            AppError::TransientNetwork(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();

        let (error, message, details) = match self {
            AppError::AuthenticationFailure(msg) => {
                tracing::warn!("🔒 Authentication failed: {}", msg);
                ("Authentication Failed", msg, None)
            }
            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                ("Unauthorized", msg, None)
            }
            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden access: {}", msg);
                ("Forbidden", msg, None)
            }
            AppError::NotFound(msg) => {
                tracing::info!("Resource not found: {}", msg);
                ("Not Found", msg, None)
            }
            AppError::StateConflict(msg) => {
                tracing::warn!("⚠️ State conflict: {}", msg);
                ("State Conflict", msg, None)
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                ("Bad Request", msg, None)
            }
            AppError::TransientNetwork(msg) => {
                tracing::error!("📡 Backend unavailable: {}", msg);
                (
                    "Network Error",
                    "Network error. Please check your connection.".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                (
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
            AppError::Jwt(msg) => {
                tracing::warn!("JWT error: {}", msg);
                ("JWT Error", msg, None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: error.to_string(),
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, id } => {
                not_found_error(collection.as_str(), &id)
            }
            StoreError::PreconditionFailed { .. } => AppError::StateConflict(e.to_string()),
            StoreError::AlreadyExists { .. } => AppError::StateConflict(e.to_string()),
            StoreError::Unavailable(msg) => AppError::TransientNetwork(msg),
            StoreError::Decode(msg) | StoreError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::AuthenticationFailure("Invalid email or password".to_string())
            }
            AuthError::EmailTaken(email) => {
                AppError::StateConflict(format!("Email '{}' already registered", email))
            }
            AuthError::Hash(msg) => AppError::Internal(msg),
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de transición inválida
pub fn conflict_error(resource: &str, id: &str, reason: &str) -> AppError {
    AppError::StateConflict(format!("{} '{}': {}", resource, id, reason))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Collection;

    #[test]
    fn precondition_failure_maps_to_conflict() {
        let err: AppError = StoreError::PreconditionFailed {
            collection: Collection::Vehicles,
            id: "V1".into(),
            detail: "status es \"ASSIGNED\"".into(),
        }
        .into();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "STATE_CONFLICT");
    }

    #[test]
    fn unavailable_backend_maps_to_transient() {
        let err: AppError = StoreError::Unavailable("pool timed out".into()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
