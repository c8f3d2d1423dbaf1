//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::controllers::{LifecycleController, RequestController};
use crate::gateway::{AuthProvider, DocumentStore};
use crate::services::AuthService;
use crate::utils::clock::Clock;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: EnvironmentConfig,
    pub clock: Arc<dyn Clock>,
    pub auth: Arc<AuthService>,
    pub lifecycle: Arc<LifecycleController>,
    pub requests: Arc<RequestController>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth_provider: Arc<dyn AuthProvider>,
        config: EnvironmentConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            auth_provider,
            store.clone(),
            JwtConfig::from(&config),
        ));
        let lifecycle = Arc::new(LifecycleController::new(store.clone(), clock.clone()));
        let requests = Arc::new(RequestController::new(
            store.clone(),
            lifecycle.clone(),
            clock.clone(),
        ));

        Self {
            store,
            config,
            clock,
            auth,
            lifecycle,
            requests,
        }
    }
}
