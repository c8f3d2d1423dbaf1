//! Streams SSE sobre suscripciones del almacén
//!
//! Cada conexión abre su propia suscripción; cuando el cliente se desconecta
//! axum suelta el stream y con él la `Subscription`, que aborta su tarea. El
//! stream también termina cuando la sesión se cierra o expira.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use chrono::Utc;
use futures::future::{self, Future};
use futures::stream::{self, Stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::dto::request_dto::RequestListQuery;
use crate::dto::vehicle_dto::VehicleListQuery;
use crate::gateway::Snapshot;
use crate::middleware::AuthSession;
use crate::models::{RequestStatus, Vehicle, VehicleRequest};
use crate::repositories::{RequestRepository, VehicleRepository};
use crate::services::{fleet_projection, AuthService, Session};
use crate::state::AppState;
use crate::utils::errors::AppError;

const MAX_PAGE: usize = 200;

pub fn create_stream_router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(stream_vehicles))
        .route("/requests", get(stream_requests))
        .route("/dashboard", get(stream_dashboard))
        .route("/me/vehicle", get(stream_my_vehicle))
}

fn snapshot_event<T>(name: &'static str, snapshot: Snapshot) -> Event
where
    T: DeserializeOwned + Serialize,
{
    let event = snapshot
        .into_models::<T>()
        .map_err(AppError::from)
        .and_then(|models| {
            Event::default()
                .event(name)
                .json_data(models)
                .map_err(|e| AppError::Internal(e.to_string()))
        });

    match event {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("⚠️ Snapshot '{}' descartado: {}", name, e);
            Event::default().event("error").data(e.to_string())
        }
    }
}

/// Se resuelve cuando la sesión se revoca o expira
fn session_end(auth: Arc<AuthService>, session: &Session) -> impl Future<Output = ()> + Send + 'static {
    let mut revocations = auth.revocations();
    let session_id = session.session_id.clone();
    let ttl = (session.expires_at - Utc::now()).to_std().unwrap_or_default();

    async move {
        let expiry = tokio::time::sleep(ttl);
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                _ = &mut expiry => break,
                revoked = revocations.recv() => match revoked {
                    Ok(id) if id == session_id => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(_)) => {
                        if !auth.is_active(&session_id).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("📴 Stream cerrado: sesión {} terminada", session_id);
    }
}

async fn stream_vehicles(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(query): Query<VehicleListQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.vehicles_limit).min(MAX_PAGE);
    let subscription = VehicleRepository::new(state.store.clone())
        .subscribe(query.status.status(), limit)
        .await?;

    let events = subscription
        .into_stream()
        .map(|snapshot| Ok::<_, Infallible>(snapshot_event::<Vehicle>("vehicles", snapshot)))
        .take_until(session_end(state.auth.clone(), &session));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn stream_requests(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(query): Query<RequestListQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    session.require_master("watch requests")?;
    let subscription = RequestRepository::new(state.store.clone())
        .subscribe(query.status)
        .await?;

    let events = subscription
        .into_stream()
        .map(|snapshot| Ok::<_, Infallible>(snapshot_event::<VehicleRequest>("requests", snapshot)))
        .take_until(session_end(state.auth.clone(), &session));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Vehículo actual del conductor: lista vacía cuando no tiene ninguno
async fn stream_my_vehicle(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = VehicleRepository::new(state.store.clone())
        .subscribe_driver(&session.uid)
        .await?;

    let events = subscription
        .into_stream()
        .map(|snapshot| Ok::<_, Infallible>(snapshot_event::<Vehicle>("vehicle", snapshot)))
        .take_until(session_end(state.auth.clone(), &session));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

enum DashboardUpdate {
    Vehicles(Snapshot),
    Requests(Snapshot),
}

/// Estadísticas recalculadas con cada snapshot de vehículos o solicitudes
async fn stream_dashboard(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    session.require_master("view dashboard")?;

    let vehicles = VehicleRepository::new(state.store.clone())
        .subscribe_all()
        .await?
        .into_stream()
        .map(DashboardUpdate::Vehicles);
    let requests = RequestRepository::new(state.store.clone())
        .subscribe(Some(RequestStatus::Pending))
        .await?
        .into_stream()
        .map(DashboardUpdate::Requests);

    // Sin emitir hasta tener un snapshot confirmado de cada colección
    let events = stream::select(vehicles, requests)
        .scan(
            (None::<Vec<Vehicle>>, None::<Vec<VehicleRequest>>),
            |latest, update| {
                let (fleet, pending) = latest;
                let decoded = match update {
                    DashboardUpdate::Vehicles(snapshot) => {
                        snapshot.into_models().map(|models| *fleet = Some(models))
                    }
                    DashboardUpdate::Requests(snapshot) => {
                        snapshot.into_models().map(|models| *pending = Some(models))
                    }
                };

                let event = match (decoded, fleet.as_deref(), pending.as_deref()) {
                    (Err(e), _, _) => {
                        tracing::warn!("⚠️ Snapshot del dashboard descartado: {}", e);
                        Some(Event::default().event("error").data(e.to_string()))
                    }
                    (Ok(()), Some(fleet), Some(pending)) => {
                        let stats = fleet_projection::dashboard_stats(fleet, pending);
                        Some(Event::default().event("stats").json_data(stats).unwrap_or_else(
                            |e| Event::default().event("error").data(e.to_string()),
                        ))
                    }
                    (Ok(()), _, _) => None,
                };
                future::ready(Some(event))
            },
        )
        .filter_map(future::ready)
        .map(Ok::<_, Infallible>)
        .take_until(session_end(state.auth.clone(), &session));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
