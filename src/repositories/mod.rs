//! Repositorios tipados sobre el almacén de documentos

pub mod driver_repository;
pub mod request_repository;
pub mod trip_history_repository;
pub mod vehicle_repository;

pub use driver_repository::DriverRepository;
pub use request_repository::RequestRepository;
pub use trip_history_repository::TripHistoryRepository;
pub use vehicle_repository::VehicleRepository;
