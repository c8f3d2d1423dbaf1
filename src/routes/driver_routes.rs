use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::dto::vehicle_dto::HistoryQuery;
use crate::middleware::AuthSession;
use crate::models::{Driver, TripHistory, Vehicle};
use crate::repositories::{DriverRepository, TripHistoryRepository, VehicleRepository};
use crate::state::AppState;
use crate::utils::errors::AppError;

const MAX_HISTORY: usize = 100;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/available", get(available_drivers))
        .route("/me/vehicle", get(my_vehicle))
        .route("/me/history", get(my_history))
}

/// Conductores activos sin vehículo (selector de asignación)
async fn available_drivers(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Vec<Driver>>, AppError> {
    session.require_master("list available drivers")?;
    let drivers = DriverRepository::new(state.store.clone())
        .list_available()
        .await?;
    Ok(Json(drivers))
}

async fn my_vehicle(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Option<Vehicle>>, AppError> {
    let vehicle = VehicleRepository::new(state.store.clone())
        .find_by_driver(&session.uid)
        .await?;
    Ok(Json(vehicle))
}

async fn my_history(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TripHistory>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.trips_limit).min(MAX_HISTORY);
    let trips = TripHistoryRepository::new(state.store.clone())
        .list_by_driver(&session.uid, limit)
        .await?;
    Ok(Json(trips))
}
