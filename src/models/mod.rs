//! Modelos del sistema
//!
//! Este módulo contiene los modelos de documentos del backend con los nombres
//! de campo camelCase que usan las colecciones.

pub mod dashboard;
pub mod driver;
pub mod trip_history;
pub mod vehicle;
pub mod vehicle_request;

pub use dashboard::{DashboardStats, StepStatus, TimeEstimate, Timeline, TimelineStep};
pub use driver::{Driver, DriverRole};
pub use trip_history::TripHistory;
pub use vehicle::{Vehicle, VehicleStatus, VehicleTimestamps};
pub use vehicle_request::{RequestStatus, VehicleRequest};
