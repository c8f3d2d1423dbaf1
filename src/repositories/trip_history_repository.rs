use std::sync::Arc;

use crate::gateway::{Collection, Direction, DocumentStore, Query};
use crate::models::TripHistory;
use crate::utils::errors::AppError;

pub struct TripHistoryRepository {
    store: Arc<dyn DocumentStore>,
}

impl TripHistoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Historial de un conductor, más reciente primero
    pub async fn list_by_driver(
        &self,
        driver_id: &str,
        limit: usize,
    ) -> Result<Vec<TripHistory>, AppError> {
        let snapshot = self
            .store
            .query(
                &Query::new(Collection::TripHistory)
                    .filter("driverId", driver_id)
                    .order_by("createdAt", Direction::Desc)
                    .limit(limit),
            )
            .await?;
        Ok(snapshot.into_models()?)
    }

    pub async fn list_by_vehicle(&self, vehicle_id: &str) -> Result<Vec<TripHistory>, AppError> {
        let snapshot = self
            .store
            .query(
                &Query::new(Collection::TripHistory)
                    .filter("vehicleId", vehicle_id)
                    .order_by("createdAt", Direction::Desc),
            )
            .await?;
        Ok(snapshot.into_models()?)
    }
}
