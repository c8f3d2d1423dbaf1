mod common;

use axum::body::{to_bytes, Body, BodyDataStream};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use fleet_manager::config::EnvironmentConfig;
use fleet_manager::gateway::DocumentStore;
use fleet_manager::routes::create_router;
use fleet_manager::state::AppState;
use fleet_manager::utils::clock::Clock;

use common::{fleet, PASSWORD};

async fn create_test_app() -> Router {
    let f = fleet().await;
    let config = EnvironmentConfig::from_lookup(|_| None).unwrap();
    let store: Arc<dyn DocumentStore> = f.store.clone();
    let clock: Arc<dyn Clock> = f.clock.clone();
    create_router(AppState::new(store, f.auth.clone(), config, clock))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Lector mínimo de eventos SSE sobre el cuerpo de la respuesta
struct SseReader {
    body: BodyDataStream,
    buffer: String,
}

impl SseReader {
    async fn open(app: &Router, uri: &str, token: &str) -> Self {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        Self {
            body: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    /// Siguiente evento con nombre; `None` cuando el servidor cerró el stream
    async fn next_event(&mut self) -> Option<(String, Value)> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let raw: String = self.buffer.drain(..end + 2).collect();
                let mut name = String::new();
                let mut data = String::new();
                for line in raw.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        name = value.trim_start().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim_start());
                    }
                }
                if name.is_empty() && data.is_empty() {
                    continue;
                }
                return Some((name, serde_json::from_str(&data).unwrap_or(Value::Null)));
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.body.next())
                .await
                .expect("no SSE data within 5s")?;
            let bytes = chunk.unwrap();
            self.buffer.push_str(std::str::from_utf8(&bytes).unwrap());
        }
    }
}

async fn login(app: &Router, uid: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": format!("{}@fleet.test", uid), "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["backend"]["configured"], false);
    assert_eq!(body["activeSessions"], 0);

    login(&app, "d1").await;
    let (_, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(body["activeSessions"], 1);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = create_test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "d1@fleet.test", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_rejects_malformed_email() {
    let app = create_test_app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "not-an-email", "password": "x" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_requires_session() {
    let app = create_test_app().await;
    let (status, _) = send(&app, "GET", "/api/vehicles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_assign_then_conflict() {
    let app = create_test_app().await;
    let token = login(&app, "master").await;

    let assign = json!({ "driverId": "d1", "destination": "Warehouse B" });
    let (status, body) = send(&app, "POST", "/api/vehicles/V1/assign", Some(&token), Some(assign.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["to"], "ASSIGNED");

    let (status, body) = send(&app, "POST", "/api/vehicles/V1/assign", Some(&token), Some(assign)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "GET", "/api/vehicles?status=ASSIGNED", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/dashboard/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalVehicles"], 2);
    assert_eq!(body["assigned"], 1);
}

#[tokio::test]
async fn test_driver_flow_and_logout() {
    let app = create_test_app().await;
    let master = login(&app, "master").await;
    let d1 = login(&app, "d1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests",
        Some(&d1),
        Some(json!({ "vehicleId": "V2", "destination": "Warehouse B", "reason": "Ruta norte" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/api/requests/{}/approve", request_id), Some(&d1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "POST", &format!("/api/requests/{}/approve", request_id), Some(&master), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/drivers/me/vehicle", Some(&d1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "V2");

    let (status, _) = send(&app, "POST", "/api/vehicles/V2/start-trip", Some(&d1), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/vehicles/V2/timeline", Some(&d1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["steps"][1]["status"], "active");
    assert_eq!(body["status"], "IN_TRANSIT");
    assert_eq!(body["statusLabel"], "In Transit");

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&d1), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&d1), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_stream_waits_for_both_snapshots() {
    let app = create_test_app().await;
    let master = login(&app, "master").await;
    let d1 = login(&app, "d1").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/requests",
        Some(&d1),
        Some(json!({ "vehicleId": "V1", "destination": "Warehouse B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut stream = SseReader::open(&app, "/api/stream/dashboard", &master).await;
    let (name, stats) = stream.next_event().await.unwrap();
    assert_eq!(name, "stats");
    assert_eq!(stats["totalVehicles"], 2);
    assert_eq!(stats["available"], 2);
    assert_eq!(stats["pendingRequests"], 1);
}

#[tokio::test]
async fn test_stream_ends_after_logout() {
    let app = create_test_app().await;
    let d1 = login(&app, "d1").await;

    let mut stream = SseReader::open(&app, "/api/stream/me/vehicle", &d1).await;
    let (name, vehicles) = stream.next_event().await.unwrap();
    assert_eq!(name, "vehicle");
    assert_eq!(vehicles, json!([]));

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&d1), None).await;
    assert_eq!(status, StatusCode::OK);

    assert!(stream.next_event().await.is_none());
}
