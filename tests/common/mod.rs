#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Barrier;

use fleet_manager::controllers::{LifecycleController, RequestController};
use fleet_manager::gateway::{
    Collection, Document, DocumentStore, LocalAuthProvider, MemoryStore, Query, Snapshot,
    StoreError, Subscription, WriteOp,
};
use fleet_manager::models::DriverRole;
use fleet_manager::services::seed_service::{apply_seed, SeedData, SeedDriver, SeedVehicle};
use fleet_manager::services::Session;
use fleet_manager::utils::clock::{Clock, ManualClock};

pub const PASSWORD: &str = "secret-password";

pub struct Fleet {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<LocalAuthProvider>,
    pub clock: Arc<ManualClock>,
    pub lifecycle: Arc<LifecycleController>,
    pub requests: RequestController,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

fn seed_driver(id: &str, name: &str, role: DriverRole) -> SeedDriver {
    SeedDriver {
        id: id.to_string(),
        name: name.to_string(),
        phone: String::new(),
        email: format!("{}@fleet.test", id),
        role,
        is_active: true,
        password: PASSWORD.to_string(),
    }
}

/// Dos conductores, un master y dos vehículos disponibles
pub async fn fleet() -> Fleet {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let auth = Arc::new(LocalAuthProvider::new(dyn_store.clone()).with_hash_cost(4));
    let clock = Arc::new(ManualClock::new(start_time()));

    let seed = SeedData {
        drivers: vec![
            seed_driver("master", "Marta Master", DriverRole::VehicleMaster),
            seed_driver("d1", "Diego Uno", DriverRole::Driver),
            seed_driver("d2", "Dana Dos", DriverRole::Driver),
        ],
        vehicles: vec![
            SeedVehicle {
                id: "V1".to_string(),
                warehouse: "Warehouse A".to_string(),
                current_location: None,
            },
            SeedVehicle {
                id: "V2".to_string(),
                warehouse: "Warehouse A".to_string(),
                current_location: None,
            },
        ],
    };
    apply_seed(dyn_store.clone(), &auth, seed, start_time())
        .await
        .expect("seed");

    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let lifecycle = Arc::new(LifecycleController::new(dyn_store.clone(), dyn_clock.clone()));
    let requests = RequestController::new(dyn_store, lifecycle.clone(), dyn_clock);

    Fleet {
        store,
        auth,
        clock,
        lifecycle,
        requests,
    }
}

pub fn session(uid: &str, role: DriverRole) -> Session {
    Session {
        session_id: format!("session-{}", uid),
        uid: uid.to_string(),
        email: format!("{}@fleet.test", uid),
        name: uid.to_string(),
        role,
        expires_at: start_time() + chrono::Duration::hours(24),
    }
}

pub fn master() -> Session {
    session("master", DriverRole::VehicleMaster)
}

pub fn driver(uid: &str) -> Session {
    session(uid, DriverRole::Driver)
}

/// Envoltorio de almacén que fuerza intercalados concretos entre lectura y
/// escritura
pub struct InterleavingStore {
    inner: Arc<MemoryStore>,
    read_gate: Option<Arc<Barrier>>,
    before_commit: StdMutex<Option<Vec<WriteOp>>>,
}

impl InterleavingStore {
    /// Cada `get` de un vehículo espera a que `parties` lectores lleguen
    pub fn gated_reads(inner: Arc<MemoryStore>, parties: usize) -> Self {
        Self {
            inner,
            read_gate: Some(Arc::new(Barrier::new(parties))),
            before_commit: StdMutex::new(None),
        }
    }

    /// El próximo `commit` aplica antes este lote rival
    pub fn competing_write(inner: Arc<MemoryStore>, ops: Vec<WriteOp>) -> Self {
        Self {
            inner,
            read_gate: None,
            before_commit: StdMutex::new(Some(ops)),
        }
    }
}

#[async_trait]
impl DocumentStore for InterleavingStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let document = self.inner.get(collection, id).await?;
        if let (Collection::Vehicles, Some(gate)) = (collection, &self.read_gate) {
            gate.wait().await;
        }
        Ok(document)
    }

    async fn query(&self, query: &Query) -> Result<Snapshot, StoreError> {
        self.inner.query(query).await
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<String>, StoreError> {
        let competing = self.before_commit.lock().unwrap().take();
        if let Some(competing) = competing {
            self.inner.commit(competing).await?;
        }
        self.inner.commit(ops).await
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        self.inner.subscribe(query).await
    }
}

/// Lote que asigna `vehicle_id` a `driver_id` por fuera del controlador
pub fn rival_assignment(vehicle_id: &str, driver_id: &str) -> Vec<WriteOp> {
    let fields = |value: serde_json::Value| value.as_object().cloned().unwrap();
    vec![
        WriteOp::Update {
            collection: Collection::Vehicles,
            id: vehicle_id.to_string(),
            fields: fields(json!({
                "status": "ASSIGNED",
                "driverId": driver_id,
                "driverName": driver_id,
                "destination": "Warehouse Z",
            })),
            preconditions: Vec::new(),
        },
        WriteOp::Update {
            collection: Collection::Users,
            id: driver_id.to_string(),
            fields: fields(json!({ "currentVehicleId": vehicle_id })),
            preconditions: Vec::new(),
        },
    ]
}
