//! Tipos de proyección para dashboards y timeline
//!
//! Se calculan siempre a partir de snapshots confirmados; nunca se persisten.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::VehicleStatus;
use crate::utils::timestamp;

/// Conteo de flota por estado
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_vehicles: usize,
    pub available: usize,
    pub assigned: usize,
    pub in_transit: usize,
    pub returning: usize,
    pub pending_requests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

/// Tiempo restante estimado; heurística de presentación, no una garantía
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEstimate {
    pub minutes_left: i64,
    pub estimated: bool,
}

impl TimeEstimate {
    pub fn label(&self) -> String {
        format!("~{} min left (estimate)", self.minutes_left)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStep {
    pub label: &'static str,
    pub location: String,
    #[serde(with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<TimeEstimate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub vehicle_id: String,
    pub status: VehicleStatus,
    pub status_label: &'static str,
    pub steps: Vec<TimelineStep>,
}
