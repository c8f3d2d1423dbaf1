use std::sync::Arc;

use crate::gateway::{Collection, DocumentStore, Query};
use crate::models::{Driver, DriverRole};
use crate::utils::errors::{not_found_error, AppError};

pub struct DriverRepository {
    store: Arc<dyn DocumentStore>,
}

impl DriverRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Driver>, AppError> {
        match self.store.get(Collection::Users, id).await? {
            Some(doc) => Ok(Some(doc.into_model()?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Driver, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Driver profile", id))
    }

    /// Conductores activos sin vehículo asignado
    pub async fn list_available(&self) -> Result<Vec<Driver>, AppError> {
        let snapshot = self
            .store
            .query(
                &Query::new(Collection::Users)
                    .filter("role", DriverRole::Driver.as_str())
                    .filter("isActive", true),
            )
            .await?;

        let mut drivers: Vec<Driver> = snapshot
            .into_models::<Driver>()?
            .into_iter()
            .filter(Driver::is_available)
            .collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }
}
