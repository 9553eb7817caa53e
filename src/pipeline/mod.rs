//! Batch delete pipeline
//!
//! One submission fans out into three tasks: a producer streaming alias
//! identifiers into a bounded channel, a consumer applying them in chunks
//! inside a single transaction, and a supervisor that publishes the outcome
//! on the [`DeleteTicket`]. A failed or panicking consumer drops its
//! transaction, which rolls back every chunk applied so far.

mod ticket;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use crate::errors::{Result, ShortenerError};
use crate::identity::CallerId;
use crate::storage::SoftDeleteStorage;

pub use ticket::{DeleteState, DeleteTicket};

/// Default number of identifiers per soft-delete statement
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Producer/consumer handoff capacity
const HANDOFF_CAPACITY: usize = 1;

#[derive(Clone)]
pub struct DeletePipeline {
    storage: Arc<dyn SoftDeleteStorage>,
    chunk_size: usize,
}

impl DeletePipeline {
    /// A zero chunk size is treated as one
    pub fn new(storage: Arc<dyn SoftDeleteStorage>, chunk_size: usize) -> Self {
        Self {
            storage,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Start deleting `short_urls` for `caller` and return immediately.
    ///
    /// Must be called within a tokio runtime.
    pub fn submit(&self, caller: CallerId, short_urls: Vec<String>) -> DeleteTicket {
        let (state_tx, state_rx) = watch::channel(DeleteState::Accepted);
        let (id_tx, id_rx) = mpsc::channel::<String>(HANDOFF_CAPACITY);

        let span = info_span!("batch_delete", caller = %caller, requested = short_urls.len());

        let producer = tokio::spawn(produce(short_urls, id_tx).instrument(span.clone()));
        let consumer = tokio::spawn(
            consume(
                self.storage.clone(),
                caller,
                id_rx,
                self.chunk_size,
                state_tx.clone(),
            )
            .instrument(span.clone()),
        );
        tokio::spawn(supervise(consumer, producer, state_tx).instrument(span));

        DeleteTicket::new(state_rx)
    }
}

/// Stream identifiers in order; stops early once the consumer is gone
async fn produce(short_urls: Vec<String>, tx: mpsc::Sender<String>) {
    for short_url in short_urls {
        if tx.send(short_url).await.is_err() {
            debug!("Delete consumer closed the channel, producer stopping");
            return;
        }
    }
}

async fn consume(
    storage: Arc<dyn SoftDeleteStorage>,
    caller: CallerId,
    mut rx: mpsc::Receiver<String>,
    chunk_size: usize,
    state: watch::Sender<DeleteState>,
) -> Result<u64> {
    let mut txn = storage.begin_soft_delete().await?;
    state.send_replace(DeleteState::Streaming);

    let mut chunk: Vec<String> = Vec::with_capacity(chunk_size);
    let mut rows = 0u64;
    let mut flushes = 0usize;

    while let Some(short_url) = rx.recv().await {
        chunk.push(short_url);
        if chunk.len() == chunk_size {
            rows += txn.soft_delete(&caller, &chunk).await?;
            flushes += 1;
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        rows += txn.soft_delete(&caller, &chunk).await?;
        flushes += 1;
    }

    state.send_replace(DeleteState::Committing);
    txn.commit().await?;

    debug!("Applied {} delete chunks", flushes);
    Ok(rows)
}

async fn supervise(
    consumer: JoinHandle<Result<u64>>,
    producer: JoinHandle<()>,
    state: watch::Sender<DeleteState>,
) {
    let outcome = match consumer.await {
        Ok(Ok(rows)) => {
            info!("Batch delete committed, {} aliases flagged deleted", rows);
            DeleteState::Committed { rows }
        }
        Ok(Err(e)) => {
            error!("Batch delete rolled back: {}", e);
            DeleteState::Aborted {
                reason: e.message().to_string(),
            }
        }
        Err(join_err) => {
            let err = if join_err.is_panic() {
                ShortenerError::transaction("delete worker panicked")
            } else {
                ShortenerError::transaction("delete worker was cancelled")
            };
            error!("Batch delete rolled back: {}", err);
            DeleteState::Aborted {
                reason: err.message().to_string(),
            }
        }
    };

    // The receiver is gone by now, so the producer is finishing or finished
    producer.abort();
    let _ = producer.await;

    state.send_replace(outcome);
}
