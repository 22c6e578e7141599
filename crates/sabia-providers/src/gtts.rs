//! Google Translate text-to-speech, the universally available fallback.
//!
//! The endpoint accepts at most 100 characters per request, so text is
//! split on word boundaries and the MP3 segments are concatenated.

use std::time::Duration;

use async_trait::async_trait;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::SpeechProducer;
use sabia_core::types::AudioClip;

const TTS_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 100;

pub struct GoogleTranslateSpeech {
    url: String,
    client: reqwest::Client,
}

impl GoogleTranslateSpeech {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; SabiaBot/0.2)")
            .build()
            .map_err(|e| SabiaError::Synthesis(format!("HTTP client: {e}")))?;
        Ok(Self {
            url: TTS_URL.into(),
            client,
        })
    }
}

/// Split into chunks of at most `max` chars, breaking between words when possible.
pub fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        // Words longer than a chunk are cut hard.
        while word.chars().count() > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max).collect();
            word = word.chars().skip(max).collect();
            chunks.push(head);
        }
        let needed = if current.is_empty() { 0 } else { 1 } + word.chars().count();
        if current.chars().count() + needed > max {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechProducer for GoogleTranslateSpeech {
    fn name(&self) -> &str {
        "gtts"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip> {
        let lang = language.split(['-', '_']).next().unwrap_or(language).to_lowercase();
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SabiaError::Synthesis("nothing to speak".into()));
        }
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let resp = self
                .client
                .get(&self.url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", lang.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .send()
                .await
                .map_err(|e| SabiaError::Synthesis(format!("gTTS request failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(SabiaError::Synthesis(format!("gTTS returned {status}")));
            }
            let is_audio = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|ct| ct.starts_with("audio/"))
                .unwrap_or(false);
            if !is_audio {
                return Err(SabiaError::Synthesis("gTTS returned non-audio content".into()));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| SabiaError::Synthesis(format!("gTTS body: {e}")))?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(SabiaError::Synthesis("gTTS returned no audio".into()));
        }
        tracing::debug!("🔊 gTTS produced {} bytes in {} chunks", audio.len(), chunks.len());
        Ok(AudioClip::mp3(audio, text))
    }
}
