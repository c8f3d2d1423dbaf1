//! Servicios del sistema
//!
//! Autenticación con sesiones explícitas, proyecciones de flota y carga de
//! datos iniciales.

pub mod auth_service;
pub mod fleet_projection;
pub mod seed_service;

pub use auth_service::{AuthService, LoginResult, Session};
