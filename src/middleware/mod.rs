//! Middleware del sistema
//!
//! Este módulo contiene la extracción de sesión y la configuración de CORS.

pub mod auth;
pub mod cors;

pub use auth::AuthSession;
pub use cors::cors_middleware;
