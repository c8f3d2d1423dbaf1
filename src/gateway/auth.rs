//! Proveedor de autenticación
//!
//! El proveedor real es externo; aquí solo vive el contrato y un adaptador
//! local que guarda hashes bcrypt en la colección `credentials` del mismo
//! almacén de documentos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use super::{Collection, DocumentStore, StoreError};

/// Identidad autenticada devuelta por el proveedor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRecord {
    uid: String,
    email: String,
    password_hash: String,
}

/// Adaptador local sobre el almacén de documentos
pub struct LocalAuthProvider {
    store: Arc<dyn DocumentStore>,
    hash_cost: u32,
}

impl LocalAuthProvider {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Coste de bcrypt reducido para pruebas
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Registrar credenciales para un uid existente.
    ///
    /// El documento usa el email normalizado como id, así que la unicidad la
    /// garantiza la propia creación atómica del almacén.
    pub async fn register(&self, uid: &str, email: &str, password: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);

        let password = password.to_string();
        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        let created = self
            .store
            .create(
                Collection::Credentials,
                Some(email.clone()),
                json!({
                    "uid": uid,
                    "email": email,
                    "passwordHash": password_hash,
                }),
            )
            .await;

        match created {
            Ok(_) => {
                tracing::info!("🔑 Credenciales registradas para {}", uid);
                Ok(())
            }
            Err(StoreError::AlreadyExists { .. }) => Err(AuthError::EmailTaken(email)),
            Err(e) => Err(e.into()),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let Some(document) = self.store.get(Collection::Credentials, &email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        let record: CredentialRecord = document.into_model()?;

        let password = password.to_string();
        let hash = record.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity {
            uid: record.uid,
            email: record.email,
        })
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthError> {
        tracing::debug!("👋 Sign-out en proveedor local para {}", identity.uid);
        Ok(())
    }
}
