//! Message handler trait: what a worker runs for each dequeued message.

use async_trait::async_trait;

use crate::error::{Result, SabiaError};
use crate::types::ChatMessage;

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message end to end. `Err` marks the message Failed; the
    /// handler is expected to have shown the user something already.
    async fn handle(&self, message: ChatMessage) -> Result<()>;

    /// Last-resort notice when `handle` could not report on its own (e.g. it panicked).
    async fn report_failure(&self, _message: &ChatMessage, _error: &SabiaError) {}
}
