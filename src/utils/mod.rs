//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, JWT, timestamps
//! y la fuente de tiempo.

pub mod clock;
pub mod errors;
pub mod jwt;
pub mod timestamp;
