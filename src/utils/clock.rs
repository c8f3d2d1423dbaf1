//! Fuente de tiempo inyectable para los controladores

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Reloj usado para sellar transiciones y calcular duraciones
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reloj del sistema
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Reloj manual para escenarios de prueba
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, ts: DateTime<Utc>) {
        if let Ok(mut current) = self.current.lock() {
            *current = ts;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current
            .lock()
            .map(|ts| *ts)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}
