//! Per-message pipeline run by the workers.
//!
//! Every message first gets a "Processing..." acknowledgment; the final
//! reply (text or image) replaces it in place. When editing fails the reply
//! is sent as a new message instead.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use sabia_core::config::GreetingsConfig;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::{MessageHandler, Transport};
use sabia_core::types::ChatMessage;
use sabia_providers::SpeechChain;

use crate::responder::{Reply, Responder};
use crate::wordcloud::WordCloudService;

pub const PROCESSING_TEXT: &str = "Processing...";

pub const HELP_TEXT: &str = "You can make questions about artificial intelligence and correlated topics \
or use /wordcloud (or /wc) followed by text, URL, or a Wikipedia article title to generate a word cloud.";

pub const WORDCLOUD_FAILED_TEXT: &str = "Unexpected error while generating word cloud. Please try again later.";

pub const UNEXPECTED_TEXT: &str = "Unexpected error. Please try again later.";

/// Prepended to greetings and answers, not to command output or voice.
pub const REPLY_PREFIX: &str = "Chatbot: ";

/// What a message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Help,
    WordCloud(String),
    Question,
}

impl Route {
    /// Commands may carry a `@botname` suffix.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim_start();
        if !trimmed.starts_with('/') {
            return Route::Question;
        }
        let (head, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        let command = head.split('@').next().unwrap_or(head).to_lowercase();
        match command.as_str() {
            "/start" | "/help" => Route::Help,
            "/wordcloud" | "/wc" => Route::WordCloud(rest.trim().to_string()),
            _ => Route::Question,
        }
    }
}

struct Greetings {
    inputs: HashSet<String>,
    outputs: Vec<String>,
}

impl Greetings {
    fn new(config: &GreetingsConfig) -> Self {
        Self {
            inputs: config.inputs.iter().map(|w| w.to_lowercase()).collect(),
            outputs: config.outputs.clone(),
        }
    }

    /// A random greeting if any word of `text` is a greeting input.
    fn reply_to(&self, text: &str) -> Option<String> {
        let greeted = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .any(|w| self.inputs.contains(&w));
        if !greeted {
            return None;
        }
        self.outputs.choose(&mut rand::thread_rng()).cloned()
    }
}

pub struct ChatHandler {
    transport: Arc<dyn Transport>,
    responder: Arc<Responder>,
    wordcloud: Arc<WordCloudService>,
    greetings: Greetings,
    speech: Option<Arc<SpeechChain>>,
    /// Acknowledgment id per message, keyed by `received_order`. An entry
    /// outlives `handle` only when the handler panicked.
    acks: Mutex<HashMap<u64, i64>>,
}

impl ChatHandler {
    pub fn new(
        transport: Arc<dyn Transport>,
        responder: Arc<Responder>,
        wordcloud: Arc<WordCloudService>,
        greetings: &GreetingsConfig,
    ) -> Self {
        Self {
            transport,
            responder,
            wordcloud,
            greetings: Greetings::new(greetings),
            speech: None,
            acks: Mutex::new(HashMap::new()),
        }
    }

    /// Follow text answers with a synthesized voice reply.
    pub fn with_voice(mut self, speech: Arc<SpeechChain>) -> Self {
        self.speech = Some(speech);
        self
    }

    fn acks(&self) -> std::sync::MutexGuard<'_, HashMap<u64, i64>> {
        self.acks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the acknowledgment with `text`, or send it fresh if editing fails.
    async fn deliver(&self, chat_id: i64, ack_id: i64, text: &str) -> Result<()> {
        match self.transport.edit_text(chat_id, ack_id, text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("[chat_id={}] Edit failed ({}), sending a new message", chat_id, e);
                self.transport.send_text(chat_id, text).await.map(|_| ())
            }
        }
    }

    async fn word_cloud(&self, chat_id: i64, ack_id: i64, argument: &str) -> Result<()> {
        let outcome = match self.wordcloud.generate(argument).await {
            Ok(image) => self.transport.edit_media(chat_id, ack_id, image).await,
            Err(e) => Err(e),
        };
        let Err(e) = outcome else {
            return Ok(());
        };
        let notice = if e.is_user_facing() {
            format!("Error: {e}")
        } else {
            tracing::error!("[chat_id={}] Word cloud failed: {}", chat_id, e);
            WORDCLOUD_FAILED_TEXT.to_string()
        };
        if let Err(send_err) = self.deliver(chat_id, ack_id, &notice).await {
            tracing::error!("[chat_id={}] Could not report word cloud failure: {}", chat_id, send_err);
        }
        Err(e)
    }

    /// Best effort; missing audio is not an error.
    async fn speak(&self, chat_id: i64, reply: &Reply) {
        let Some(speech) = &self.speech else {
            return;
        };
        let Some(clip) = speech.synthesize(&reply.text, reply.language()).await else {
            tracing::debug!("[chat_id={}] No audio available", chat_id);
            return;
        };
        if let Err(e) = self.transport.send_voice(chat_id, &clip).await {
            tracing::warn!("[chat_id={}] Voice reply not sent: {}", chat_id, e);
        }
    }

    async fn respond(&self, message: &ChatMessage, ack_id: i64) -> Result<()> {
        let chat_id = message.chat_id;
        match Route::parse(&message.text) {
            Route::Help => self.deliver(chat_id, ack_id, HELP_TEXT).await,
            Route::WordCloud(argument) => self.word_cloud(chat_id, ack_id, &argument).await,
            Route::Question => {
                if let Some(greeting) = self.greetings.reply_to(&message.text) {
                    return self.deliver(chat_id, ack_id, &format!("{REPLY_PREFIX}{greeting}")).await;
                }
                let reply = self.responder.reply(&message.text).await;
                self.deliver(chat_id, ack_id, &format!("{REPLY_PREFIX}{}", reply.text)).await?;
                self.speak(chat_id, &reply).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MessageHandler for ChatHandler {
    async fn handle(&self, message: ChatMessage) -> Result<()> {
        let chat_id = message.chat_id;
        tracing::info!("💬 [chat_id={}] Processing message #{}", chat_id, message.received_order);

        let ack_id = self.transport.send_text(chat_id, PROCESSING_TEXT).await?;
        self.acks().insert(message.received_order, ack_id);

        let outcome = self.respond(&message, ack_id).await;
        self.acks().remove(&message.received_order);
        outcome?;

        tracing::info!("✅ [chat_id={}] Processing completed", chat_id);
        Ok(())
    }

    /// Shown in place of the acknowledgment when one was sent.
    async fn report_failure(&self, message: &ChatMessage, error: &SabiaError) {
        let chat_id = message.chat_id;
        tracing::error!("[chat_id={}] Unexpected failure: {}", chat_id, error);
        let ack_id = self.acks().remove(&message.received_order);
        let notified = match ack_id {
            Some(ack_id) => self.deliver(chat_id, ack_id, UNEXPECTED_TEXT).await,
            None => self.transport.send_text(chat_id, UNEXPECTED_TEXT).await.map(|_| ()),
        };
        if let Err(e) = notified {
            tracing::error!("[chat_id={}] Could not notify user: {}", chat_id, e);
        }
    }
}
