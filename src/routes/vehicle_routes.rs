use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::controllers::TransitionOutcome;
use crate::dto::vehicle_dto::{AssignVehicleRequest, VehicleListQuery};
use crate::dto::ApiResponse;
use crate::middleware::AuthSession;
use crate::models::{Timeline, Vehicle};
use crate::repositories::VehicleRepository;
use crate::services::fleet_projection;
use crate::state::AppState;
use crate::utils::errors::AppError;

const MAX_PAGE: usize = 200;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/:id", get(get_vehicle))
        .route("/:id/timeline", get(get_timeline))
        .route("/:id/assign", post(assign_vehicle))
        .route("/:id/start-trip", post(start_trip))
        .route("/:id/start-return", post(start_return))
        .route("/:id/complete", post(complete_trip))
}

async fn list_vehicles(
    State(state): State<AppState>,
    AuthSession(_session): AuthSession,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.vehicles_limit).min(MAX_PAGE);
    let vehicles = VehicleRepository::new(state.store.clone())
        .list(query.status.status(), limit)
        .await?;
    Ok(Json(vehicles))
}

async fn get_vehicle(
    State(state): State<AppState>,
    AuthSession(_session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    let vehicle = VehicleRepository::new(state.store.clone()).get(&id).await?;
    Ok(Json(vehicle))
}

async fn get_timeline(
    State(state): State<AppState>,
    AuthSession(_session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Timeline>, AppError> {
    let vehicle = VehicleRepository::new(state.store.clone()).get(&id).await?;
    Ok(Json(fleet_projection::timeline(&vehicle, state.clock.now())))
}

async fn assign_vehicle(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Json(request): Json<AssignVehicleRequest>,
) -> Result<Json<ApiResponse<TransitionOutcome>>, AppError> {
    request.validate()?;
    let outcome = state
        .lifecycle
        .assign_vehicle(&session, &id, &request.driver_id, &request.destination)
        .await?;
    Ok(Json(ApiResponse::success_with_message(outcome, "Vehicle assigned")))
}

async fn start_trip(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransitionOutcome>>, AppError> {
    let outcome = state.lifecycle.start_trip(&session, &id).await?;
    Ok(Json(ApiResponse::success_with_message(outcome, "Trip started successfully")))
}

async fn start_return(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransitionOutcome>>, AppError> {
    let outcome = state.lifecycle.start_return(&session, &id).await?;
    Ok(Json(ApiResponse::success_with_message(outcome, "Return journey started")))
}

async fn complete_trip(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransitionOutcome>>, AppError> {
    let outcome = state.lifecycle.complete_trip(&session, &id).await?;
    Ok(Json(ApiResponse::success_with_message(outcome, "Trip completed")))
}
