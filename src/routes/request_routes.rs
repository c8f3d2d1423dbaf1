use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::controllers::RequestOutcome;
use crate::dto::request_dto::{CreateVehicleRequestBody, RequestListQuery};
use crate::dto::ApiResponse;
use crate::middleware::AuthSession;
use crate::models::VehicleRequest;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_request_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/:id/approve", post(approve_request))
        .route("/:id/reject", post(reject_request))
}

async fn list_requests(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<VehicleRequest>>, AppError> {
    let requests = state.requests.list_requests(&session, query.status).await?;
    Ok(Json(requests))
}

async fn create_request(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(body): Json<CreateVehicleRequestBody>,
) -> Result<Json<ApiResponse<VehicleRequest>>, AppError> {
    body.validate()?;
    let request = state
        .requests
        .create_request(&session, &body.vehicle_id, &body.destination, &body.reason)
        .await?;
    Ok(Json(ApiResponse::success_with_message(request, "Request submitted")))
}

async fn approve_request(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let outcome = state.requests.approve_request(&session, &id).await?;
    Ok(Json(ApiResponse::success_with_message(
        outcome,
        "Request approved and vehicle assigned",
    )))
}

async fn reject_request(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestOutcome>>, AppError> {
    let outcome = state.requests.reject_request(&session, &id).await?;
    Ok(Json(ApiResponse::success_with_message(outcome, "Request rejected")))
}
