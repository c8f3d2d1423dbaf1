//! Suscripciones supervisadas
//!
//! Cada suscripción es una tarea que vuelve a ejecutar su consulta cuando el
//! almacén anuncia un cambio en la colección. El `Subscription` es dueño de la
//! tarea: al cancelarlo o soltarlo la tarea se aborta y los avisos tardíos se
//! descartan.

use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::{Collection, DocumentStore, Query, Snapshot};

const SNAPSHOT_BUFFER: usize = 16;

/// Handle cancelable sobre un flujo de snapshots confirmados
pub struct Subscription {
    receiver: mpsc::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Siguiente snapshot; `None` cuando el almacén cerró la suscripción
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Teardown explícito
    pub fn cancel(self) {
        drop(self);
    }

    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send + 'static {
        stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|snapshot| (snapshot, sub))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Lanzar la tarea que alimenta una suscripción
pub(crate) fn spawn_query_subscription<S>(
    store: Arc<S>,
    query: Query,
    mut changes: broadcast::Receiver<Collection>,
) -> Subscription
where
    S: DocumentStore + ?Sized + 'static,
{
    let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);

    let task = tokio::spawn(async move {
        let collection = query.collection;

        if !push_snapshot(store.as_ref(), &query, &sender).await {
            return;
        }

        loop {
            match changes.recv().await {
                Ok(changed) if changed == collection => {}
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        "📡 Suscripción a '{}' atrasada {} eventos, re-consultando",
                        collection,
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }

            if !push_snapshot(store.as_ref(), &query, &sender).await {
                break;
            }
        }

        tracing::debug!("📴 Suscripción a '{}' terminada", collection);
    });

    Subscription { receiver, task }
}

/// Devuelve `false` cuando el consumidor ya no existe
async fn push_snapshot<S>(
    store: &S,
    query: &Query,
    sender: &mpsc::Sender<Snapshot>,
) -> bool
where
    S: DocumentStore + ?Sized,
{
    match store.query(query).await {
        Ok(snapshot) => sender.send(snapshot).await.is_ok(),
        Err(e) => {
            // Se conserva el último snapshot confirmado del consumidor
            tracing::warn!("⚠️ Error re-consultando '{}': {}", query.collection, e);
            !sender.is_closed()
        }
    }
}
