//! # Sabia Providers
//!
//! Speech synthesis for voice replies. Producers are tried in priority
//! order by [`SpeechChain`]: the Hugging Face model first (only when a
//! token is configured), then Google Translate TTS.

pub mod failover;
pub mod gtts;
pub mod huggingface;

use std::time::Duration;

use sabia_core::config::SabiaConfig;
use sabia_core::error::Result;
use sabia_core::traits::SpeechProducer;

pub use failover::SpeechChain;
pub use gtts::GoogleTranslateSpeech;
pub use huggingface::HuggingFaceSpeech;

/// Build the speech chain from configuration.
pub fn create_speech_chain(config: &SabiaConfig) -> Result<SpeechChain> {
    let timeout = Duration::from_secs(config.voice.timeout_secs);
    let mut producers: Vec<Box<dyn SpeechProducer>> = Vec::new();

    match config.huggingface_token.as_deref() {
        Some(token) if !token.trim().is_empty() => {
            producers.push(Box::new(HuggingFaceSpeech::new(
                token.trim(),
                config.voice.huggingface_models.clone(),
                timeout,
            )?));
        }
        _ => tracing::info!("HUGGINGFACE_TOKEN not set, voice replies use gTTS only"),
    }
    producers.push(Box::new(GoogleTranslateSpeech::new(timeout)?));

    Ok(SpeechChain::new(producers, timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_without_token_is_gtts_only() {
        let chain = create_speech_chain(&SabiaConfig::default()).unwrap();
        assert_eq!(chain.producer_names(), vec!["gtts"]);
    }

    #[test]
    fn test_token_enables_huggingface_first() {
        let config = SabiaConfig {
            huggingface_token: Some("hf_secret".into()),
            ..SabiaConfig::default()
        };
        let chain = create_speech_chain(&config).unwrap();
        assert_eq!(chain.producer_names(), vec!["huggingface", "gtts"]);
    }
}
