use std::sync::Arc;

use crate::gateway::{Collection, Direction, DocumentStore, Query, Subscription};
use crate::models::{RequestStatus, VehicleRequest};
use crate::utils::errors::{not_found_error, AppError};

pub struct RequestRepository {
    store: Arc<dyn DocumentStore>,
}

impl RequestRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn requests_query(status: Option<RequestStatus>) -> Query {
        let mut query = Query::new(Collection::VehicleRequests);
        if let Some(status) = status {
            query = query.filter("status", status.as_str());
        }
        query.order_by("requestedAt", Direction::Desc)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<VehicleRequest>, AppError> {
        match self.store.get(Collection::VehicleRequests, id).await? {
            Some(doc) => Ok(Some(doc.into_model()?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<VehicleRequest, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle request", id))
    }

    pub async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<VehicleRequest>, AppError> {
        let snapshot = self.store.query(&Self::requests_query(status)).await?;
        Ok(snapshot.into_models()?)
    }

    pub async fn subscribe(&self, status: Option<RequestStatus>) -> Result<Subscription, AppError> {
        Ok(self.store.subscribe(Self::requests_query(status)).await?)
    }
}
