use axum::{extract::State, routing::get, Json, Router};

use crate::middleware::AuthSession;
use crate::models::{DashboardStats, RequestStatus};
use crate::repositories::{RequestRepository, VehicleRepository};
use crate::services::fleet_projection;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

async fn stats(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<DashboardStats>, AppError> {
    session.require_master("view dashboard")?;

    let vehicles = VehicleRepository::new(state.store.clone()).list_all().await?;
    let pending = RequestRepository::new(state.store.clone())
        .list(Some(RequestStatus::Pending))
        .await?;
    Ok(Json(fleet_projection::dashboard_stats(&vehicles, &pending)))
}
