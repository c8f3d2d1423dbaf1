//! Backend Gateway
//!
//! Contratos del backend externo: autenticación y almacén de documentos con
//! escrituras condicionales y suscripciones en tiempo real. Los controladores
//! solo conocen estos traits; los adaptadores concretos viven en submódulos.

pub mod auth;
pub mod document;
pub mod memory;
pub mod postgres;
pub mod subscription;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub use auth::{AuthError, AuthProvider, Identity, LocalAuthProvider};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use subscription::Subscription;

/// Colecciones conocidas del almacén
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Vehicles,
    VehicleRequests,
    TripHistory,
    /// Reservada, sin uso en la lógica
    Notifications,
    Credentials,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Vehicles => "vehicles",
            Collection::VehicleRequests => "vehicle_requests",
            Collection::TripHistory => "trip_history",
            Collection::Notifications => "notifications",
            Collection::Credentials => "credentials",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "users" => Some(Collection::Users),
            "vehicles" => Some(Collection::Vehicles),
            "vehicle_requests" => Some(Collection::VehicleRequests),
            "trip_history" => Some(Collection::TripHistory),
            "notifications" => Some(Collection::Notifications),
            "credentials" => Some(Collection::Credentials),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documento tal como lo devuelve el almacén
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
    /// Se incrementa en cada escritura confirmada
    pub version: u64,
}

impl Document {
    /// Deserializar el documento a un modelo, inyectando el `id`
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let mut data = match self.data {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Decode(format!(
                    "documento '{}' no es un objeto: {}",
                    self.id, other
                )))
            }
        };
        data.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(data))
            .map_err(|e| StoreError::Decode(format!("documento '{}': {}", self.id, e)))
    }
}

/// Resultado completo de una consulta en un instante
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_models<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        self.documents.into_iter().map(Document::into_model).collect()
    }
}

/// Filtro de igualdad sobre una ruta con puntos (`timestamps.startedAt`)
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub path: String,
    pub direction: Direction,
}

/// Consulta sobre una colección
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: Collection,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, path: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            path: path.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Condición que debe cumplirse para que una escritura se aplique
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// El campo (ausente = `null`) debe ser igual al valor
    FieldEquals { path: String, value: Value },
    /// La versión actual del documento debe coincidir
    Version(u64),
}

impl Precondition {
    pub fn field_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Precondition::FieldEquals {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn field_is_null(path: impl Into<String>) -> Self {
        Precondition::FieldEquals {
            path: path.into(),
            value: Value::Null,
        }
    }
}

/// Operación de escritura dentro de un lote atómico
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Create {
        collection: Collection,
        id: Option<String>,
        data: Value,
    },
    Update {
        collection: Collection,
        id: String,
        /// Claves con puntos, se fusionan sobre el documento existente
        fields: Map<String, Value>,
        preconditions: Vec<Precondition>,
    },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Create { collection, .. } | WriteOp::Update { collection, .. } => *collection,
        }
    }
}

/// Errores del almacén de documentos
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("Document {collection}/{id} already exists")]
    AlreadyExists { collection: Collection, id: String },

    #[error("Precondition failed on {collection}/{id}: {detail}")]
    PreconditionFailed {
        collection: Collection,
        id: String,
        detail: String,
    },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Almacén de documentos con escrituras condicionales y tiempo real
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn query(&self, query: &Query) -> Result<Snapshot, StoreError>;

    /// Aplicar el lote completo o nada; devuelve los ids escritos en orden
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<String>, StoreError>;

    /// Primer snapshot inmediato y uno nuevo por cada cambio en la colección
    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;

    async fn create(
        &self,
        collection: Collection,
        id: Option<String>,
        data: Value,
    ) -> Result<String, StoreError> {
        let ids = self.commit(vec![WriteOp::Create { collection, id, data }]).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("commit sin resultado".to_string()))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
        preconditions: Vec<Precondition>,
    ) -> Result<(), StoreError> {
        self.commit(vec![WriteOp::Update {
            collection,
            id: id.to_string(),
            fields,
            preconditions,
        }])
        .await
        .map(|_| ())
    }
}
