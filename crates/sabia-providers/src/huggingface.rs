//! Hugging Face inference API text-to-speech.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use sabia_core::error::{Result, SabiaError};
use sabia_core::traits::SpeechProducer;
use sabia_core::types::AudioClip;
use serde_json::json;

const API_BASE: &str = "https://api-inference.huggingface.co/models";

pub struct HuggingFaceSpeech {
    token: String,
    models: BTreeMap<String, String>,
    api_base: String,
    client: reqwest::Client,
}

impl HuggingFaceSpeech {
    pub fn new(token: impl Into<String>, models: BTreeMap<String, String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SabiaError::Synthesis(format!("HTTP client: {e}")))?;
        Ok(Self {
            token: token.into(),
            models,
            api_base: API_BASE.into(),
            client,
        })
    }

    /// Model for a language tag; English model when the base language has none.
    pub fn model_for(&self, language: &str) -> Option<&str> {
        let base = language.split(['-', '_']).next().unwrap_or(language).to_lowercase();
        self.models
            .get(&base)
            .or_else(|| self.models.get("en"))
            .map(String::as_str)
    }
}

#[async_trait]
impl SpeechProducer for HuggingFaceSpeech {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip> {
        if self.token.is_empty() {
            return Err(SabiaError::Synthesis("no Hugging Face token".into()));
        }
        let model = self
            .model_for(language)
            .ok_or_else(|| SabiaError::Synthesis(format!("no TTS model for '{language}'")))?;
        let url = format!("{}/{}", self.api_base, model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| SabiaError::Synthesis(format!("Hugging Face request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SabiaError::Synthesis(format!("Hugging Face {model} returned {status}")));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if content_type.contains("application/json") {
            return Err(SabiaError::Synthesis(format!(
                "Hugging Face {model} returned JSON instead of audio"
            )));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SabiaError::Synthesis(format!("Hugging Face body: {e}")))?;
        if bytes.is_empty() {
            return Err(SabiaError::Synthesis(format!("Hugging Face {model} returned no audio")));
        }
        tracing::debug!("🔊 Hugging Face {} produced {} bytes", model, bytes.len());
        Ok(AudioClip::mp3(bytes.to_vec(), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn producer(token: &str) -> HuggingFaceSpeech {
        let models = BTreeMap::from([
            ("en".to_string(), "facebook/mms-tts-eng".to_string()),
            ("pt".to_string(), "facebook/mms-tts-por".to_string()),
        ]);
        HuggingFaceSpeech::new(token, models, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_model_selection() {
        let p = producer("hf_x");
        assert_eq!(p.model_for("pt-BR"), Some("facebook/mms-tts-por"));
        assert_eq!(p.model_for("en"), Some("facebook/mms-tts-eng"));
        assert_eq!(p.model_for("de"), Some("facebook/mms-tts-eng"));
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_network() {
        let err = producer("").synthesize("hello", "en").await.unwrap_err();
        assert!(matches!(err, SabiaError::Synthesis(_)));
    }
}
