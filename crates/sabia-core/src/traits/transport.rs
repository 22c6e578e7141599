//! Chat transport trait for sending, editing and uploading on the chat platform.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::AudioClip;

/// Outbound side of a chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Send a text message. Returns the platform message id.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64>;

    /// Replace the text of a previously sent message.
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;

    /// Replace a previously sent message with a PNG image.
    async fn edit_media(&self, chat_id: i64, message_id: i64, image: Vec<u8>) -> Result<()>;

    /// Upload a voice reply.
    async fn send_voice(&self, chat_id: i64, clip: &AudioClip) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;
}
