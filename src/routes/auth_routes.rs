use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, MeResponse};
use crate::dto::ApiResponse;
use crate::middleware::AuthSession;
use crate::repositories::DriverRepository;
use crate::services::LoginResult;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, AppError> {
    request.validate()?;
    let result = state.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(ApiResponse::success_with_message(result, "Login successful")))
}

async fn logout(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth.sign_out(&session).await?;
    Ok(Json(ApiResponse::message("Logout successful")))
}

async fn me(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<ApiResponse<MeResponse>>, AppError> {
    let driver = DriverRepository::new(state.store.clone())
        .get(&session.uid)
        .await?;
    Ok(Json(ApiResponse::success(MeResponse { session, driver })))
}
