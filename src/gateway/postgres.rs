//! Almacén de documentos sobre PostgreSQL
//!
//! Los documentos se guardan como JSONB en una sola tabla `documents`. Cada lote
//! corre en una transacción con `SELECT ... FOR UPDATE`, de modo que la
//! verificación de precondiciones y la escritura son atómicas. Los cambios se
//! anuncian con `pg_notify` y se reparten a las suscripciones locales.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool};
use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::document::{apply_fields, check_preconditions};
use super::subscription::spawn_query_subscription;
use super::{
    Collection, Direction, Document, DocumentStore, Query, Snapshot, StoreError, Subscription,
    WriteOp,
};

const CHANGE_CHANNEL: &str = "document_changes";
const CHANGE_BUFFER: usize = 256;
const LISTENER_RETRY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    changes: broadcast::Sender<Collection>,
}

impl PostgresStore {
    /// Ejecutar migraciones y arrancar el listener de cambios
    pub async fn connect(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Error ejecutando migraciones: {}", e)))?;

        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        tokio::spawn(listen_for_changes(pool.clone(), changes.clone()));

        tracing::info!("🐘 Almacén PostgreSQL listo");
        Ok(Self { pool, changes })
    }
}

async fn listen_for_changes(pool: PgPool, changes: broadcast::Sender<Collection>) {
    loop {
        let mut listener = match PgListener::connect_with(&pool).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("❌ No se pudo crear el listener de cambios: {}", e);
                tokio::time::sleep(LISTENER_RETRY).await;
                continue;
            }
        };
        if let Err(e) = listener.listen(CHANGE_CHANNEL).await {
            tracing::error!("❌ LISTEN {} falló: {}", CHANGE_CHANNEL, e);
            tokio::time::sleep(LISTENER_RETRY).await;
            continue;
        }

        loop {
            match listener.recv().await {
                Ok(notification) => match Collection::from_str(notification.payload()) {
                    Some(collection) => {
                        let _ = changes.send(collection);
                    }
                    None => tracing::warn!(
                        "⚠️ Notificación de colección desconocida: {}",
                        notification.payload()
                    ),
                },
                Err(e) => {
                    tracing::warn!("⚠️ Listener de cambios desconectado: {}", e);
                    break;
                }
            }
        }
        tokio::time::sleep(LISTENER_RETRY).await;
    }
}

/// SQLSTATE de deadlock y de fallo de serialización: reintentables
fn is_retryable_sqlstate(code: &str) -> bool {
    matches!(code, "40P01" | "40001")
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(ref db)
            if db.code().as_deref().is_some_and(is_retryable_sqlstate) =>
        {
            tracing::warn!("⚠️ Transacción abortada por concurrencia: {}", db);
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_string).collect()
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, (String, Value, i64)>(
            "SELECT id, data, version FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, data, version)| Document {
            id,
            data,
            version: version as u64,
        }))
    }

    async fn query(&self, query: &Query) -> Result<Snapshot, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, data, version FROM documents WHERE collection = ");
        builder.push_bind(query.collection.as_str());

        for filter in &query.filters {
            builder.push(" AND COALESCE(data #> ");
            builder.push_bind(path_segments(&filter.path));
            builder.push(", 'null'::jsonb) = ");
            builder.push_bind(filter.value.clone());
        }

        if let Some(order) = &query.order_by {
            builder.push(" ORDER BY data #> ");
            builder.push_bind(path_segments(&order.path));
            builder.push(match order.direction {
                Direction::Asc => " ASC NULLS FIRST",
                Direction::Desc => " DESC NULLS LAST",
            });
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        let rows = builder
            .build_query_as::<(String, Value, i64)>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Snapshot {
            documents: rows
                .into_iter()
                .map(|(id, data, version)| Document {
                    id,
                    data,
                    version: version as u64,
                })
                .collect(),
        })
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<String>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut ids = Vec::with_capacity(ops.len());
        let mut touched: Vec<Collection> = Vec::new();

        for op in ops {
            let collection = op.collection();
            if !touched.contains(&collection) {
                touched.push(collection);
            }

            match op {
                WriteOp::Create { id, data, .. } => {
                    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
                    let result = sqlx::query(
                        r#"
                        INSERT INTO documents (collection, id, data, version)
                        VALUES ($1, $2, $3, 1)
                        ON CONFLICT (collection, id) DO NOTHING
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(&id)
                    .bind(data)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                    if result.rows_affected() == 0 {
                        return Err(StoreError::AlreadyExists { collection, id });
                    }
                    ids.push(id);
                }
                WriteOp::Update {
                    id,
                    fields,
                    preconditions,
                    ..
                } => {
                    let current = sqlx::query_as::<_, (Value, i64)>(
                        "SELECT data, version FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
                    )
                    .bind(collection.as_str())
                    .bind(&id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                    let Some((mut data, version)) = current else {
                        return Err(StoreError::NotFound { collection, id });
                    };

                    check_preconditions(collection, &id, &data, version as u64, &preconditions)?;
                    apply_fields(&mut data, &fields);

                    sqlx::query(
                        r#"
                        UPDATE documents
                        SET data = $3, version = version + 1, updated_at = NOW()
                        WHERE collection = $1 AND id = $2
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(&id)
                    .bind(data)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                    ids.push(id);
                }
            }
        }

        // Se entregan al confirmar la transacción
        for collection in &touched {
            sqlx::query("SELECT pg_notify($1, $2)")
                .bind(CHANGE_CHANNEL)
                .bind(collection.as_str())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ids)
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let changes = self.changes.subscribe();
        Ok(spawn_query_subscription(Arc::new(self.clone()), query, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_aborts_are_retryable() {
        assert!(is_retryable_sqlstate("40P01"));
        assert!(is_retryable_sqlstate("40001"));
        assert!(!is_retryable_sqlstate("23505"));

        let mapped = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(mapped, StoreError::Unavailable(_)));
        let mapped = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, StoreError::Backend(_)));
    }
}
