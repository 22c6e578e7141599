//! Worker pool: N tasks draining the shared queue.
//!
//! Each message runs in its own spawned task so a panic inside the handler
//! becomes a Failed outcome instead of killing the worker. Failed messages
//! are never re-enqueued. Two messages from the same chat may run on two
//! workers at once; there is no per-chat ordering.

use std::sync::Arc;

use sabia_core::error::{ErrorKind, SabiaError};
use sabia_core::traits::MessageHandler;
use tokio::task::JoinHandle;

use crate::queue::MessageQueue;

pub struct WorkerPool {
    queue: Arc<MessageQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` (at least one) tasks on the current runtime.
    pub fn start(workers: usize, queue: Arc<MessageQueue>, handler: Arc<dyn MessageHandler>) -> Self {
        let workers = workers.max(1);
        let handles = (0..workers)
            .map(|id| tokio::spawn(worker_loop(id, queue.clone(), handler.clone())))
            .collect();
        tracing::info!("👷 Started {} worker(s)", workers);
        Self { queue, handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    /// Close the queue, let workers drain it, and wait for them.
    pub async fn shutdown(self) {
        self.queue.close();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task ended abnormally: {e}");
            }
        }
        tracing::info!("👷 Workers stopped");
    }
}

async fn worker_loop(id: usize, queue: Arc<MessageQueue>, handler: Arc<dyn MessageHandler>) {
    tracing::debug!("Worker {} ready", id);
    while let Some(ticket) = queue.dequeue().await {
        let message = ticket.message().clone();
        let chat_id = message.chat_id;
        let order = message.received_order;
        tracing::debug!("Worker {} processing #{} chat_id={}", id, order, chat_id);

        let task = {
            let handler = handler.clone();
            tokio::spawn(async move { handler.handle(message).await })
        };

        match task.await {
            Ok(Ok(())) => {
                tracing::debug!("Worker {} completed #{} chat_id={}", id, order, chat_id);
                ticket.complete();
            }
            Ok(Err(e)) => {
                log_failure(id, order, chat_id, &e);
                ticket.fail(e.to_string());
            }
            Err(join_error) => {
                tracing::error!("Worker {} message #{} chat_id={} panicked: {}", id, order, chat_id, join_error);
                let error = SabiaError::Other(format!("handler panicked: {join_error}"));
                handler.report_failure(ticket.message(), &error).await;
                ticket.fail(error.to_string());
            }
        }
    }
    tracing::debug!("Worker {} exiting", id);
}

fn log_failure(id: usize, order: u64, chat_id: i64, error: &SabiaError) {
    match error.kind() {
        ErrorKind::Validation => {
            tracing::info!("Worker {} #{} chat_id={} rejected input: {}", id, order, chat_id, error)
        }
        ErrorKind::Lookup | ErrorKind::Synthesis => {
            tracing::warn!("Worker {} #{} chat_id={} degraded: {}", id, order, chat_id, error)
        }
        ErrorKind::Transport | ErrorKind::Unexpected => {
            tracing::error!("Worker {} #{} chat_id={} failed: {}", id, order, chat_id, error)
        }
    }
}
