use std::sync::Arc;

use crate::gateway::{Collection, Direction, DocumentStore, Query, Subscription};
use crate::models::{Vehicle, VehicleStatus};
use crate::utils::errors::{not_found_error, AppError};

pub struct VehicleRepository {
    store: Arc<dyn DocumentStore>,
}

impl VehicleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Consulta de flota: más recientes primero, filtro opcional por estado
    pub fn fleet_query(status: Option<VehicleStatus>, limit: usize) -> Query {
        let mut query = Query::new(Collection::Vehicles);
        if let Some(status) = status {
            query = query.filter("status", status.as_str());
        }
        query.order_by("updatedAt", Direction::Desc).limit(limit)
    }

    /// Vehículo asignado a un conductor
    pub fn driver_query(driver_id: &str) -> Query {
        Query::new(Collection::Vehicles)
            .filter("driverId", driver_id)
            .limit(1)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>, AppError> {
        match self.store.get(Collection::Vehicles, id).await? {
            Some(doc) => Ok(Some(doc.into_model()?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Vehicle, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    /// Vehículo junto con la versión del documento leída
    pub async fn get_versioned(&self, id: &str) -> Result<(Vehicle, u64), AppError> {
        let doc = self
            .store
            .get(Collection::Vehicles, id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))?;
        let version = doc.version;
        Ok((doc.into_model()?, version))
    }

    pub async fn list(
        &self,
        status: Option<VehicleStatus>,
        limit: usize,
    ) -> Result<Vec<Vehicle>, AppError> {
        let snapshot = self.store.query(&Self::fleet_query(status, limit)).await?;
        Ok(snapshot.into_models()?)
    }

    /// Flota completa, sin límite
    pub async fn list_all(&self) -> Result<Vec<Vehicle>, AppError> {
        let snapshot = self.store.query(&Query::new(Collection::Vehicles)).await?;
        Ok(snapshot.into_models()?)
    }

    pub async fn find_by_driver(&self, driver_id: &str) -> Result<Option<Vehicle>, AppError> {
        let snapshot = self.store.query(&Self::driver_query(driver_id)).await?;
        Ok(snapshot.into_models::<Vehicle>()?.into_iter().next())
    }

    pub async fn subscribe(
        &self,
        status: Option<VehicleStatus>,
        limit: usize,
    ) -> Result<Subscription, AppError> {
        Ok(self.store.subscribe(Self::fleet_query(status, limit)).await?)
    }

    pub async fn subscribe_all(&self) -> Result<Subscription, AppError> {
        Ok(self.store.subscribe(Query::new(Collection::Vehicles)).await?)
    }

    pub async fn subscribe_driver(&self, driver_id: &str) -> Result<Subscription, AppError> {
        Ok(self.store.subscribe(Self::driver_query(driver_id)).await?)
    }
}
