//! Servicio de autenticación
//!
//! Autentica contra el proveedor externo, valida el perfil (rol y cuenta
//! activa) y emite el contexto de sesión explícito que reciben los
//! controladores. Las sesiones activas se registran para poder revocarlas.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::gateway::{AuthProvider, DocumentStore, Identity};
use crate::models::{Driver, DriverRole};
use crate::repositories::DriverRepository;
use crate::utils::errors::{forbidden_error, AppError};
use crate::utils::jwt::{self, JwtClaims, JwtConfig};
use crate::utils::timestamp;

const REVOCATION_BUFFER: usize = 64;

/// Contexto de sesión que se pasa a cada operación
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub uid: String,
    pub email: String,
    pub name: String,
    pub role: DriverRole,
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_master(&self) -> bool {
        self.role == DriverRole::VehicleMaster
    }

    pub fn require_master(&self, operation: &str) -> Result<(), AppError> {
        if self.is_master() {
            Ok(())
        } else {
            Err(forbidden_error(operation, "requires VEHICLE_MASTER role"))
        }
    }

    pub fn require_driver(&self, operation: &str) -> Result<(), AppError> {
        if self.role == DriverRole::Driver {
            Ok(())
        } else {
            Err(forbidden_error(operation, "requires DRIVER role"))
        }
    }
}

/// Resultado de un login exitoso
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub role: DriverRole,
    pub driver: Driver,
}

pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    drivers: DriverRepository,
    jwt: JwtConfig,
    sessions: RwLock<HashMap<String, Session>>,
    revocations: broadcast::Sender<String>,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            provider,
            drivers: DriverRepository::new(store),
            jwt,
            sessions: RwLock::new(HashMap::new()),
            revocations: broadcast::channel(REVOCATION_BUFFER).0,
        }
    }

    /// Autenticar y cargar el perfil con su rol
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<LoginResult, AppError> {
        let identity = self.provider.authenticate(email, password).await?;
        tracing::info!("🔐 Usuario autenticado: {}", identity.uid);

        let driver = self
            .drivers
            .find_by_id(&identity.uid)
            .await?
            .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

        let Some(role) = driver.role else {
            return Err(AppError::AuthenticationFailure(
                "User role not assigned".to_string(),
            ));
        };
        if !driver.is_active {
            return Err(AppError::AuthenticationFailure(
                "User account is inactive".to_string(),
            ));
        }

        let (token, claims) = jwt::generate_token(&identity.uid, &driver.name, role, &self.jwt)?;
        let session = session_from_claims(&claims, &identity.email);
        {
            let mut sessions = self.sessions.write().await;
            let purged = purge_expired(&mut sessions, Utc::now());
            if purged > 0 {
                tracing::debug!("🧹 {} sesiones expiradas eliminadas", purged);
            }
            sessions.insert(session.session_id.clone(), session.clone());
        }

        tracing::info!("🎭 Sesión iniciada para {} con rol {}", identity.uid, role);

        Ok(LoginResult {
            token,
            expires_at: session.expires_at,
            role,
            driver,
        })
    }

    /// Resolver la sesión de un token; falla si fue revocada
    pub async fn current_session(&self, token: &str) -> Result<Session, AppError> {
        let claims = jwt::verify_token(token, &self.jwt)?;
        let sessions = self.sessions.read().await;
        sessions
            .get(&claims.sid)
            .filter(|session| session.uid == claims.sub)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Session expired or signed out".to_string()))
    }

    pub async fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        self.sessions.write().await.remove(&session.session_id);
        // Sin streams abiertos no hay receptores
        let _ = self.revocations.send(session.session_id.clone());
        self.provider
            .sign_out(&Identity {
                uid: session.uid.clone(),
                email: session.email.clone(),
            })
            .await?;
        tracing::info!("👋 Sesión cerrada para {}", session.uid);
        Ok(())
    }

    /// Sesiones vigentes (no revocadas ni expiradas)
    pub async fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| !session.is_expired(now))
            .count()
    }

    pub async fn is_active(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(session_id)
            .is_some_and(|session| !session.is_expired(Utc::now()))
    }

    /// Ids de sesiones cerradas con `sign_out`
    pub fn revocations(&self) -> broadcast::Receiver<String> {
        self.revocations.subscribe()
    }
}

fn purge_expired(sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired(now));
    before - sessions.len()
}

fn session_from_claims(claims: &JwtClaims, email: &str) -> Session {
    Session {
        session_id: claims.sid.clone(),
        uid: claims.sub.clone(),
        email: email.to_string(),
        name: claims.name.clone(),
        role: claims.role,
        expires_at: Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}
