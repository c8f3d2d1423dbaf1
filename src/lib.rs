//! Fleet manager
//!
//! Ciclo de vida de vehículos de una flota (AVAILABLE → ASSIGNED → IN_TRANSIT
//! → RETURNING → AVAILABLE) y flujo de solicitudes de conductores, sobre un
//! almacén de documentos con escrituras condicionales y suscripciones.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
