//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Las credenciales del backend nunca tienen valores embebidos por defecto.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-only-fleet-secret";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Adaptador de almacén a usar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
        }
    }
}

/// Credenciales del proyecto en el backend gestionado
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub app_id: Option<String>,
}

impl BackendConfig {
    /// Las tres credenciales presentes
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.project_id.is_some() && self.app_id.is_some()
    }
}

/// Configuración del entorno
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    pub store_backend: StoreBackend,
    pub backend: BackendConfig,
    pub seed_file: Option<PathBuf>,
    pub vehicles_limit: usize,
    pub trips_limit: usize,
}

impl EnvironmentConfig {
    /// Leer la configuración de las variables de entorno del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ if environment == "production" => return Err(ConfigError::Missing("JWT_SECRET")),
            _ => {
                tracing::warn!("⚠️ JWT_SECRET no definido, usando secreto de desarrollo");
                DEV_JWT_SECRET.to_string()
            }
        };

        let store_backend = match lookup("STORE_BACKEND").as_deref() {
            Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
            None if lookup("DATABASE_URL").is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 3000)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            jwt_secret,
            jwt_expiration: parse_or(&lookup, "JWT_EXPIRATION", 86_400)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            store_backend,
            backend: BackendConfig {
                api_key: lookup("BACKEND_API_KEY"),
                project_id: lookup("BACKEND_PROJECT_ID"),
                app_id: lookup("BACKEND_APP_ID"),
            },
            seed_file: lookup("SEED_FILE").map(PathBuf::from),
            vehicles_limit: parse_or(&lookup, "VEHICLES_PAGE_LIMIT", 50)?,
            trips_limit: parse_or(&lookup, "TRIPS_PAGE_LIMIT", 20)?,
            environment,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
