//! Core data model: chat messages, processing status, sentiment, audio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbound chat message waiting for (or under) processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Chat the reply goes back to.
    pub chat_id: i64,
    /// Raw user text.
    pub text: String,
    /// Monotonic ingestion order assigned by the queue.
    pub received_order: u64,
    /// When the message was enqueued.
    pub received_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(chat_id: i64, text: impl Into<String>, received_order: u64) -> Self {
        Self {
            chat_id,
            text: text.into(),
            received_order,
            received_at: Utc::now(),
        }
    }
}

/// Per-message state machine: `Queued → InProgress → Completed | Failed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MessageStatus {
    Queued,
    InProgress,
    Completed,
    Failed(String),
}

impl MessageStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Completed | MessageStatus::Failed(_))
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Queued => write!(f, "queued"),
            MessageStatus::InProgress => write!(f, "in_progress"),
            MessageStatus::Completed => write!(f, "completed"),
            MessageStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Sentiment label produced by the NLP oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    /// Parse a model label. Anything unrecognized is neutral.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.starts_with("positive") || lower.starts_with("pos") {
            SentimentLabel::Positive
        } else if lower.starts_with("negative") || lower.starts_with("neg") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// One sentiment judgement, transient per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Confidence in [0, 1].
    pub score: f32,
    /// Language code the text was analysed in.
    pub language: String,
}

impl SentimentResult {
    pub fn neutral(language: &str) -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
            language: language.to_string(),
        }
    }
}

/// Synthesized speech ready to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    /// Upload file name, e.g. `reply_hello-world.mp3`.
    pub file_name: String,
    pub mime_type: String,
}

impl AudioClip {
    pub fn mp3(bytes: Vec<u8>, text: &str) -> Self {
        Self {
            bytes,
            file_name: format!("reply_{}.mp3", slug(text, 40)),
            mime_type: "audio/mpeg".into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Lowercase ASCII slug of at most `max` source characters, or `speech`.
fn slug(text: &str, max: usize) -> String {
    let mut out = String::new();
    let mut dash = false;
    for c in text.chars().take(max) {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "speech".into()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing_falls_back_to_neutral() {
        assert_eq!(SentimentLabel::from_label("Positive"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_label("NEGATIVE"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_label("mixed"), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_label(""), SentimentLabel::Neutral);
    }

    #[test]
    fn test_audio_file_name() {
        let clip = AudioClip::mp3(vec![1, 2], "Hello, World!");
        assert_eq!(clip.file_name, "reply_hello-world.mp3");
        let clip = AudioClip::mp3(vec![1], "¿¿??");
        assert_eq!(clip.file_name, "reply_speech.mp3");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MessageStatus::Queued.is_terminal());
        assert!(!MessageStatus::InProgress.is_terminal());
        assert!(MessageStatus::Completed.is_terminal());
        assert!(MessageStatus::Failed("x".into()).is_terminal());
    }
}
