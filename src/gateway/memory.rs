//! Almacén de documentos en memoria
//!
//! Adaptador de desarrollo y pruebas. Cada lote toma el lock de escritura una
//! sola vez: verifica todas las precondiciones y solo entonces aplica.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::document::{apply_fields, check_preconditions, compare_by, matches_filters};
use super::subscription::spawn_query_subscription;
use super::{Collection, Document, DocumentStore, Query, Snapshot, StoreError, Subscription, WriteOp};

const CHANGE_BUFFER: usize = 256;

#[derive(Debug, Clone)]
struct StoredDocument {
    data: Value,
    version: u64,
}

type Collections = HashMap<Collection, BTreeMap<String, StoredDocument>>;

struct MemoryInner {
    collections: RwLock<Collections>,
    changes: broadcast::Sender<Collection>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(MemoryInner {
                collections: RwLock::new(HashMap::new()),
                changes,
            }),
        }
    }

    /// Número de documentos en una colección
    pub async fn count(&self, collection: Collection) -> usize {
        let collections = self.inner.collections.read().await;
        collections.get(&collection).map(|docs| docs.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| Document {
                id: id.to_string(),
                data: stored.data.clone(),
                version: stored.version,
            }))
    }

    async fn query(&self, query: &Query) -> Result<Snapshot, StoreError> {
        let collections = self.inner.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Snapshot::default());
        };

        let mut documents: Vec<Document> = docs
            .iter()
            .filter(|(_, stored)| matches_filters(&stored.data, &query.filters))
            .map(|(id, stored)| Document {
                id: id.clone(),
                data: stored.data.clone(),
                version: stored.version,
            })
            .collect();

        if let Some(order) = &query.order_by {
            documents.sort_by(|a, b| compare_by(order, &a.data, &b.data));
        }
        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        Ok(Snapshot { documents })
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<String>, StoreError> {
        let mut collections = self.inner.collections.write().await;

        // Fase 1: validar todo el lote sin mutar
        let mut ids = Vec::with_capacity(ops.len());
        for op in &ops {
            match op {
                WriteOp::Create { collection, id, .. } => {
                    let id = id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                    let exists = collections
                        .get(collection)
                        .map(|docs| docs.contains_key(&id))
                        .unwrap_or(false);
                    if exists || ids.contains(&id) {
                        return Err(StoreError::AlreadyExists {
                            collection: *collection,
                            id,
                        });
                    }
                    ids.push(id);
                }
                WriteOp::Update {
                    collection,
                    id,
                    preconditions,
                    ..
                } => {
                    let stored = collections
                        .get(collection)
                        .and_then(|docs| docs.get(id))
                        .ok_or_else(|| StoreError::NotFound {
                            collection: *collection,
                            id: id.clone(),
                        })?;
                    check_preconditions(*collection, id, &stored.data, stored.version, preconditions)?;
                    ids.push(id.clone());
                }
            }
        }

        // Fase 2: aplicar
        let mut touched = Vec::new();
        for (op, id) in ops.into_iter().zip(ids.iter()) {
            let collection = op.collection();
            if !touched.contains(&collection) {
                touched.push(collection);
            }
            let docs = collections.entry(collection).or_default();
            match op {
                WriteOp::Create { data, .. } => {
                    docs.insert(id.clone(), StoredDocument { data, version: 1 });
                }
                WriteOp::Update { fields, .. } => {
                    if let Some(stored) = docs.get_mut(id) {
                        apply_fields(&mut stored.data, &fields);
                        stored.version += 1;
                    }
                }
            }
        }
        drop(collections);

        for collection in touched {
            // Sin suscriptores el envío falla; no es un error
            let _ = self.inner.changes.send(collection);
        }

        Ok(ids)
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let changes = self.inner.changes.subscribe();
        Ok(spawn_query_subscription(Arc::new(self.clone()), query, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Direction, Precondition};
    use serde_json::{json, Map};

    fn status_fields(status: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(status));
        fields
    }

    #[tokio::test]
    async fn failed_batch_leaves_store_untouched() {
        let store = MemoryStore::new();
        store
            .create(Collection::Vehicles, Some("V1".into()), json!({ "status": "AVAILABLE" }))
            .await
            .unwrap();

        let result = store
            .commit(vec![
                WriteOp::Create {
                    collection: Collection::TripHistory,
                    id: None,
                    data: json!({ "vehicleId": "V1" }),
                },
                WriteOp::Update {
                    collection: Collection::Vehicles,
                    id: "V1".into(),
                    fields: status_fields("ASSIGNED"),
                    preconditions: vec![Precondition::field_equals("status", "RETURNING")],
                },
            ])
            .await;

        assert!(matches!(result, Err(StoreError::PreconditionFailed { .. })));
        assert_eq!(store.count(Collection::TripHistory).await, 0);
        let doc = store.get(Collection::Vehicles, "V1").await.unwrap().unwrap();
        assert_eq!(doc.data["status"], "AVAILABLE");
        assert_eq!(doc.version, 1);
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for (id, status, updated) in [
            ("A", "AVAILABLE", "2025-01-01T10:00:00.000Z"),
            ("B", "ASSIGNED", "2025-01-01T11:00:00.000Z"),
            ("C", "AVAILABLE", "2025-01-01T12:00:00.000Z"),
            ("D", "AVAILABLE", "2025-01-01T09:00:00.000Z"),
        ] {
            store
                .create(
                    Collection::Vehicles,
                    Some(id.into()),
                    json!({ "status": status, "updatedAt": updated }),
                )
                .await
                .unwrap();
        }

        let snapshot = store
            .query(
                &Query::new(Collection::Vehicles)
                    .filter("status", "AVAILABLE")
                    .order_by("updatedAt", Direction::Desc)
                    .limit(2),
            )
            .await
            .unwrap();

        let ids: Vec<_> = snapshot.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A"]);
    }

    #[tokio::test]
    async fn subscription_pushes_initial_and_changed_snapshots() {
        let store = MemoryStore::new();
        let mut sub = store
            .subscribe(Query::new(Collection::Vehicles).filter("status", "AVAILABLE"))
            .await
            .unwrap();

        let first = sub.next().await.unwrap();
        assert!(first.is_empty());

        store
            .create(Collection::Vehicles, Some("V9".into()), json!({ "status": "AVAILABLE" }))
            .await
            .unwrap();

        let second = sub.next().await.unwrap();
        assert_eq!(second.documents.len(), 1);
        assert_eq!(second.documents[0].id, "V9");
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = MemoryStore::new();
        store
            .create(Collection::Users, Some("u1".into()), json!({}))
            .await
            .unwrap();
        let err = store
            .create(Collection::Users, Some("u1".into()), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }
}
