//! Shared message queue, the single hand-off between ingestion and workers.
//!
//! Unbounded by default. With a capacity, `enqueue` rejects when full and
//! `enqueue_wait` waits for room. The lock guards bookkeeping only and is
//! never held across an await.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use sabia_core::error::{Result, SabiaError};
use sabia_core::types::{ChatMessage, MessageStatus};
use serde::Serialize;
use tokio::sync::Notify;

/// Terminal outcomes kept for inspection.
const HISTORY_LIMIT: usize = 100;

/// A finished message.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub order: u64,
    pub chat_id: i64,
    pub status: MessageStatus,
    pub finished_at: DateTime<Utc>,
}

/// Counts per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub queued: usize,
    pub in_progress: usize,
    pub completed: u64,
    pub failed: u64,
    /// Refused because the queue was full.
    pub rejected: u64,
    pub total_enqueued: u64,
}

struct QueueState {
    queue: VecDeque<ChatMessage>,
    closed: bool,
    next_order: u64,
    in_progress: usize,
    completed: u64,
    failed: u64,
    rejected: u64,
    history: VecDeque<Outcome>,
}

enum Push {
    Accepted(u64),
    Full,
    Closed,
}

pub struct MessageQueue {
    state: Mutex<QueueState>,
    capacity: Option<usize>,
    items: Notify,
    space: Notify,
}

impl MessageQueue {
    /// `None` = unbounded.
    pub fn new(capacity: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                closed: false,
                next_order: 1,
                in_progress: 0,
                completed: 0,
                failed: 0,
                rejected: 0,
                history: VecDeque::new(),
            }),
            capacity,
            items: Notify::new(),
            space: Notify::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Bookkeeping stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn push(&self, chat_id: i64, text: &str, count_rejection: bool) -> Push {
        let order = {
            let mut state = self.lock();
            if state.closed {
                return Push::Closed;
            }
            if let Some(cap) = self.capacity {
                if state.queue.len() >= cap {
                    if count_rejection {
                        state.rejected += 1;
                    }
                    return Push::Full;
                }
            }
            let order = state.next_order;
            state.next_order += 1;
            state.queue.push_back(ChatMessage::new(chat_id, text, order));
            tracing::debug!(
                "📥 Enqueued #{} chat_id={} (queued: {}, active: {})",
                order,
                chat_id,
                state.queue.len(),
                state.in_progress
            );
            order
        };
        self.items.notify_one();
        Push::Accepted(order)
    }

    /// Non-blocking. Returns the message's ingestion order.
    pub fn enqueue(&self, chat_id: i64, text: &str) -> Result<u64> {
        match self.push(chat_id, text, true) {
            Push::Accepted(order) => Ok(order),
            Push::Full => {
                let cap = self.capacity.unwrap_or_default();
                tracing::warn!("Queue full ({}), rejected message chat_id={}", cap, chat_id);
                Err(SabiaError::QueueFull(cap))
            }
            Push::Closed => Err(SabiaError::QueueClosed),
        }
    }

    /// Like [`enqueue`](Self::enqueue) but waits for room on a bounded queue.
    pub async fn enqueue_wait(&self, chat_id: i64, text: &str) -> Result<u64> {
        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            match self.push(chat_id, text, false) {
                Push::Accepted(order) => return Ok(order),
                Push::Closed => return Err(SabiaError::QueueClosed),
                Push::Full => notified.await,
            }
        }
    }

    /// Wait for the next message. `None` once the queue is closed and drained.
    pub async fn dequeue(self: &Arc<Self>) -> Option<InFlight> {
        loop {
            let notified = self.items.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if let Some(message) = state.queue.pop_front() {
                    state.in_progress += 1;
                    let more = !state.queue.is_empty();
                    drop(state);
                    self.space.notify_one();
                    if more {
                        self.items.notify_one();
                    }
                    return Some(InFlight {
                        queue: Arc::clone(self),
                        message,
                        finished: false,
                    });
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Stop intake. Queued messages are still handed out.
    pub fn close(&self) {
        self.lock().closed = true;
        self.items.notify_waiters();
        self.space.notify_waiters();
        tracing::info!("Message queue closed");
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            queued: state.queue.len(),
            in_progress: state.in_progress,
            completed: state.completed,
            failed: state.failed,
            rejected: state.rejected,
            total_enqueued: state.next_order - 1,
        }
    }

    /// Most recent terminal outcomes, oldest first.
    pub fn history(&self) -> Vec<Outcome> {
        self.lock().history.iter().cloned().collect()
    }

    fn finish(&self, message: &ChatMessage, status: MessageStatus) {
        let mut state = self.lock();
        state.in_progress = state.in_progress.saturating_sub(1);
        match status {
            MessageStatus::Failed(_) => state.failed += 1,
            _ => state.completed += 1,
        }
        state.history.push_back(Outcome {
            order: message.received_order,
            chat_id: message.chat_id,
            status,
            finished_at: Utc::now(),
        });
        while state.history.len() > HISTORY_LIMIT {
            state.history.pop_front();
        }
    }
}

/// A dequeued message. Finishing it records the outcome exactly once;
/// dropping it unfinished records a failure.
pub struct InFlight {
    queue: Arc<MessageQueue>,
    message: ChatMessage,
    finished: bool,
}

impl InFlight {
    pub fn message(&self) -> &ChatMessage {
        &self.message
    }

    pub fn complete(mut self) {
        self.finish(MessageStatus::Completed);
    }

    pub fn fail(mut self, reason: impl Into<String>) {
        self.finish(MessageStatus::Failed(reason.into()));
    }

    fn finish(&mut self, status: MessageStatus) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.queue.finish(&self.message, status);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                "Message #{} chat_id={} dropped before completion",
                self.message.received_order,
                self.message.chat_id
            );
            self.finish(MessageStatus::Failed("abandoned".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_and_orders() {
        let q = MessageQueue::new(None);
        assert_eq!(q.enqueue(1, "a").unwrap(), 1);
        assert_eq!(q.enqueue(2, "b").unwrap(), 2);
        let first = q.dequeue().await.unwrap();
        assert_eq!(first.message().text, "a");
        assert_eq!(first.message().received_order, 1);
        let second = q.dequeue().await.unwrap();
        assert_eq!(second.message().chat_id, 2);
        assert_eq!(q.stats().in_progress, 2);
        first.complete();
        second.fail("boom");
        let stats = q.stats();
        assert_eq!((stats.completed, stats.failed, stats.in_progress), (1, 1, 0));
        let history = q.history();
        assert_eq!(history[0].status, MessageStatus::Completed);
        assert_eq!(history[1].status, MessageStatus::Failed("boom".into()));
    }

    #[tokio::test]
    async fn test_bounded_rejects_when_full() {
        let q = MessageQueue::new(Some(1));
        q.enqueue(1, "a").unwrap();
        assert!(matches!(q.enqueue(1, "b"), Err(SabiaError::QueueFull(1))));
        assert_eq!(q.stats().rejected, 1);
        assert_eq!(q.stats().total_enqueued, 1);
    }

    #[tokio::test]
    async fn test_enqueue_wait_blocks_until_room() {
        let q = MessageQueue::new(Some(1));
        q.enqueue(1, "a").unwrap();
        let producer = {
            let q = q.clone();
            tokio::spawn(async move { q.enqueue_wait(1, "b").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!producer.is_finished());
        let ticket = q.dequeue().await.unwrap();
        assert_eq!(producer.await.unwrap().unwrap(), 2);
        ticket.complete();
        assert_eq!(q.stats().rejected, 0);
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_items() {
        let q = MessageQueue::new(None);
        let consumer = {
            let q = q.clone();
            tokio::spawn(async move { q.dequeue().await.map(|t| t.message().text.clone()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        q.enqueue(3, "late").unwrap();
        assert_eq!(consumer.await.unwrap().as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let q = MessageQueue::new(None);
        q.enqueue(1, "a").unwrap();
        q.close();
        assert!(matches!(q.enqueue(1, "b"), Err(SabiaError::QueueClosed)));
        q.dequeue().await.unwrap().complete();
        assert!(q.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn test_close_wakes_idle_consumers() {
        let q = MessageQueue::new(None);
        let consumer = {
            let q = q.clone();
            tokio::spawn(async move { q.dequeue().await.is_none() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        q.close();
        assert!(consumer.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_ticket_counts_as_failed_once() {
        let q = MessageQueue::new(None);
        q.enqueue(1, "a").unwrap();
        drop(q.dequeue().await.unwrap());
        let stats = q.stats();
        assert_eq!((stats.completed, stats.failed, stats.in_progress), (0, 1, 0));
        assert_eq!(q.history().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let q = MessageQueue::new(None);
        for i in 0..(HISTORY_LIMIT as i64 + 20) {
            q.enqueue(i, "x").unwrap();
            q.dequeue().await.unwrap().complete();
        }
        let history = q.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].order, 21);
    }
}
