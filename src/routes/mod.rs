//! Rutas HTTP
//!
//! Capa de comandos (POST) y capa de proyección (GET y streams SSE).

pub mod auth_routes;
pub mod dashboard_routes;
pub mod driver_routes;
pub mod request_routes;
pub mod stream_routes;
pub mod vehicle_routes;

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_middleware;
use crate::state::AppState;

/// Router completo de la API
pub fn create_router(state: AppState) -> Router {
    let cors = cors_middleware(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes::create_auth_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/requests", request_routes::create_request_router())
        .nest("/api/drivers", driver_routes::create_driver_router())
        .nest("/api/dashboard", dashboard_routes::create_dashboard_router())
        .nest("/api/stream", stream_routes::create_stream_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check con el estado del almacén y de las sesiones
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let backend = &state.config.backend;
    Json(json!({
        "service": "fleet-manager",
        "status": "healthy",
        "environment": state.config.environment,
        "store": state.config.store_backend.as_str(),
        "backend": {
            "projectId": backend.project_id,
            "appId": backend.app_id,
            "configured": backend.is_configured(),
        },
        "activeSessions": state.auth.active_sessions().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
