//! Telegram Bot transport: message sending/editing via the Bot API plus
//! a long-polling loop for deployments without a public webhook.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::Stream;
use reqwest::multipart::{Form, Part};
use sabia_core::config::TelegramConfig;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::Transport;
use sabia_core::types::AudioClip;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::webhook::InboundText;

/// Longest text Telegram accepts in one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Long-poll wait passed to `getUpdates`.
const LONG_POLL_SECS: u64 = 30;

pub struct TelegramTransport {
    token: String,
    api_base: String,
    client: reqwest::Client,
    last_update_id: AtomicI64,
    poll_interval: Duration,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>, config: &TelegramConfig) -> Result<Self> {
        // Long polling holds the request open, so the client timeout must exceed it.
        let timeout = Duration::from_secs(config.timeout_secs.max(LONG_POLL_SECS + 5));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SabiaError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self {
            token: token.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
            last_update_id: AtomicI64::new(0),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn read<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T> {
        let body: TelegramApiResponse<T> = response
            .json()
            .await
            .map_err(|e| SabiaError::Transport(format!("Invalid Telegram {method} response: {e}")))?;
        body.into_result(method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| SabiaError::Transport(format!("Telegram {method} failed: {e}")))?;
        Self::read(method, response).await
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SabiaError::Transport(format!("Telegram {method} failed: {e}")))?;
        Self::read(method, response).await
    }

    /// Send a text message and return its `message_id`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64> {
        let sent: TelegramMessage = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": clip_text(text) }))
            .await?;
        Ok(sent.message_id)
    }

    pub async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let _: Value = self
            .call(
                "editMessageText",
                json!({ "chat_id": chat_id, "message_id": message_id, "text": clip_text(text) }),
            )
            .await?;
        Ok(())
    }

    /// Replace a message with an uploaded photo.
    pub async fn edit_message_media(&self, chat_id: i64, message_id: i64, image: Vec<u8>) -> Result<()> {
        let photo = Part::bytes(image)
            .file_name("wordcloud.png")
            .mime_str("image/png")
            .map_err(|e| SabiaError::Transport(format!("photo part: {e}")))?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("message_id", message_id.to_string())
            .text("media", json!({ "type": "photo", "media": "attach://photo" }).to_string())
            .part("photo", photo);
        let _: Value = self.call_multipart("editMessageMedia", form).await?;
        Ok(())
    }

    pub async fn send_voice_clip(&self, chat_id: i64, clip: &AudioClip) -> Result<()> {
        let voice = Part::bytes(clip.bytes.clone())
            .file_name(clip.file_name.clone())
            .mime_str(&clip.mime_type)
            .map_err(|e| SabiaError::Transport(format!("voice part: {e}")))?;
        let form = Form::new().text("chat_id", chat_id.to_string()).part("voice", voice);
        let _: Value = self.call_multipart("sendVoice", form).await?;
        Ok(())
    }

    pub async fn delete(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call("deleteMessage", json!({ "chat_id": chat_id, "message_id": message_id }))
            .await?;
        Ok(())
    }

    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", json!({})).await
    }

    /// Register the webhook URL, optionally with a secret Telegram echoes in a header.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let mut body = json!({ "url": url, "allowed_updates": ["message"] });
        if let Some(secret) = secret {
            body["secret_token"] = json!(secret);
        }
        let _: bool = self.call("setWebhook", body).await?;
        tracing::info!("🔗 Telegram webhook set to {}", url);
        Ok(())
    }

    /// Required before `getUpdates` works on a bot that had a webhook.
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", json!({})).await?;
        Ok(())
    }

    /// Fetch updates after the last seen one (long polling).
    pub async fn get_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = self.last_update_id.load(Ordering::Relaxed) + 1;
        let updates: Vec<TelegramUpdate> = self
            .call(
                "getUpdates",
                json!({ "offset": offset, "timeout": LONG_POLL_SECS, "allowed_updates": ["message"] }),
            )
            .await?;
        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::Relaxed);
        }
        Ok(updates)
    }

    /// Start the polling loop; returns a stream of inbound texts.
    pub fn start_polling(self: Arc<Self>) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            tracing::info!("📡 Telegram polling loop started");
            loop {
                match self.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            let Some(inbound) = update.to_inbound() else { continue };
                            if tx.send(inbound).is_err() {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
                if tx.is_closed() {
                    return;
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        });

        TelegramPollingStream { rx }
    }
}

/// Cut text to Telegram's message limit.
pub fn clip_text(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    clipped.push('…');
    clipped
}

/// Stream of inbound texts from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<InboundText>,
}

impl Stream for TelegramPollingStream {
    type Item = InboundText;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64> {
        self.send_message(chat_id, text).await
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        self.edit_message_text(chat_id, message_id, text).await
    }

    async fn edit_media(&self, chat_id: i64, message_id: i64, image: Vec<u8>) -> Result<()> {
        self.edit_message_media(chat_id, message_id, image).await
    }

    async fn send_voice(&self, chat_id: i64, clip: &AudioClip) -> Result<()> {
        self.send_voice_clip(chat_id, clip).await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        self.delete(chat_id, message_id).await
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> TelegramApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(SabiaError::Transport(format!(
                "Telegram {method} error: {}",
                self.description.unwrap_or_default()
            )));
        }
        self.result
            .ok_or_else(|| SabiaError::Transport(format!("Telegram {method} returned no result")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    #[serde(default)]
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
}

impl TelegramUpdate {
    /// Text messages from humans only.
    pub fn to_inbound(&self) -> Option<InboundText> {
        let msg = self.message.as_ref()?;
        let text = msg.text.as_ref()?;
        if msg.from.as_ref().is_some_and(|f| f.is_bot) {
            return None;
        }
        Some(InboundText {
            chat_id: msg.chat.id,
            text: text.clone(),
        })
    }
}
