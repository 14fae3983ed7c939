//! Single-writer actor: one dedicated connection executes all write jobs
//! serially, each inside an immediate transaction. SQLite allows only one
//! writer at a time, and funneling writes through a single task keeps the
//! upsert-then-sweep sequences of a refresh atomic.

use std::any::Any;
use std::sync::Arc;

use diesel::{Connection, SqliteConnection};
use log::error;
use tokio::sync::{mpsc, oneshot};

use super::DbPool;
use crate::errors::StorageError;
use flexfolio_core::errors::Result;

type ErasedResult = Result<Box<dyn Any + Send + 'static>>;
type Job = Box<dyn FnOnce(&mut SqliteConnection) -> ErasedResult + Send + 'static>;

const QUEUE_DEPTH: usize = 1024;

/// Cloneable handle for submitting write jobs to the actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<(Job, oneshot::Sender<ErasedResult>)>,
}

impl WriteHandle {
    /// Runs `job` on the writer connection inside an immediate transaction
    /// and returns its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + Any + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let erased: Job = Box::new(move |conn| job(conn).map(|v| Box::new(v) as Box<dyn Any + Send>));
        self.tx
            .send((erased, reply_tx))
            .await
            .map_err(|_| StorageError::CoreError("database writer has shut down".to_string()))?;

        let boxed = reply_rx
            .await
            .map_err(|_| StorageError::CoreError("database writer dropped the reply".to_string()))??;
        boxed.downcast::<T>().map(|v| *v).map_err(|_| {
            StorageError::CoreError("database writer returned an unexpected type".to_string())
                .into()
        })
    }
}

/// Spawns the writer task. The actor owns one pooled connection for its
/// whole lifetime and processes jobs in submission order.
pub fn spawn_writer(pool: Arc<DbPool>) -> Result<WriteHandle> {
    let (tx, mut rx) = mpsc::channel::<(Job, oneshot::Sender<ErasedResult>)>(QUEUE_DEPTH);

    let mut conn = super::get_connection(&pool)?;
    tokio::spawn(async move {
        while let Some((job, reply_tx)) = rx.recv().await {
            let result: ErasedResult = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());
            if let Err(ref e) = result {
                error!("write job failed: {e}");
            }
            // The requester may have given up; that is fine.
            let _ = reply_tx.send(result);
        }
    });

    Ok(WriteHandle { tx })
}
