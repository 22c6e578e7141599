//! Sabia configuration system.
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional TOML file, and environment variables (a `.env` file is honoured).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, SabiaError};
use crate::types::SentimentLabel;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SabiaConfig {
    /// Telegram Bot API token. Required.
    #[serde(default)]
    pub telegram_token: String,
    /// Number of queue workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Queue bound; `None` means unbounded.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// JSON corpus of `{question, answer, tags}` entries.
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: String,
    /// Enables the Hugging Face speech producer when present.
    #[serde(default)]
    pub huggingface_token: Option<String>,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub nlp: NlpConfig,
    #[serde(default)]
    pub wordcloud: WordCloudConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    /// Reply templates keyed by base language code.
    #[serde(default = "default_templates")]
    pub templates: BTreeMap<String, LanguageTemplates>,
    #[serde(default)]
    pub greetings: GreetingsConfig,
}

fn default_workers() -> usize { 1 }
fn default_knowledge_path() -> String { "knowledge_base.json".into() }

impl Default for SabiaConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            workers: default_workers(),
            queue_capacity: None,
            knowledge_path: default_knowledge_path(),
            huggingface_token: None,
            gateway: GatewayConfig::default(),
            telegram: TelegramConfig::default(),
            retrieval: RetrievalConfig::default(),
            voice: VoiceConfig::default(),
            nlp: NlpConfig::default(),
            wordcloud: WordCloudConfig::default(),
            lookup: LookupConfig::default(),
            templates: default_templates(),
            greetings: GreetingsConfig::default(),
        }
    }
}

impl SabiaConfig {
    /// Load config: `.env`, then the TOML file (explicit path, `SABIA_CONFIG`,
    /// or `~/.sabia/config.toml`), then environment overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(env_path) => tracing::debug!("Loaded environment from {}", env_path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("⚠️  Ignoring unreadable .env: {e}"),
        }

        let mut config = match path {
            Some(p) => {
                tracing::info!("📄 Config: {}", p.display());
                Self::load_from(p)?
            }
            None => {
                let p = std::env::var("SABIA_CONFIG")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| Self::default_path());
                if p.exists() {
                    tracing::info!("📄 Config: {}", p.display());
                    Self::load_from(&p)?
                } else {
                    tracing::info!("📄 No config file at {}, using defaults", p.display());
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific TOML file (no env, no validation).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SabiaError::Config(format!("Failed to read config {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SabiaError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Sabia home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sabia")
    }

    /// Apply environment overrides through `var`, so tests can inject a map.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            self.telegram_token = token.trim().to_string();
        }
        if let Some(workers) = var("SABIA_WORKERS") {
            self.workers = parse_env("SABIA_WORKERS", &workers)?;
        }
        if let Some(port) = var("PORT") {
            self.gateway.port = parse_env("PORT", &port)?;
        }
        if let Some(host) = var("SABIA_HOST") {
            self.gateway.host = host;
        }
        if let Some(token) = var("HUGGINGFACE_TOKEN") {
            let token = token.trim().to_string();
            self.huggingface_token = (!token.is_empty()).then_some(token);
        }
        if let Some(path) = var("SABIA_KNOWLEDGE_PATH") {
            self.knowledge_path = path;
        }
        if let Some(capacity) = var("SABIA_QUEUE_CAPACITY") {
            self.queue_capacity = Some(parse_env("SABIA_QUEUE_CAPACITY", &capacity)?);
        }
        if let Some(secret) = var("SABIA_WEBHOOK_SECRET") {
            self.gateway.webhook_secret = (!secret.is_empty()).then_some(secret);
        }
        if let Some(url) = var("SABIA_WEBHOOK_URL") {
            self.gateway.webhook_url = (!url.is_empty()).then_some(url);
        }
        if let Some(voice) = var("SABIA_VOICE_REPLIES") {
            self.voice.enabled = matches!(voice.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if self.workers == 0 {
            tracing::warn!("⚠️  workers = 0, running with 1");
            self.workers = 1;
        }
        Ok(())
    }

    /// Fail fast on anything that would otherwise surface at request time.
    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.trim().is_empty() {
            return Err(SabiaError::Config(
                "TELEGRAM_BOT_TOKEN environment variable is missing.".into(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(SabiaError::Config("queue_capacity must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(SabiaError::Config(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.retrieval.similarity_threshold
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(SabiaError::Config("retrieval.top_k must be at least 1".into()));
        }
        if self.nlp.model_cache_capacity == 0 {
            return Err(SabiaError::Config("nlp.model_cache_capacity must be at least 1".into()));
        }
        if !self.templates.contains_key(&self.nlp.default_language) {
            return Err(SabiaError::Template(format!(
                "no templates for default language '{}'",
                self.nlp.default_language
            )));
        }
        for (language, templates) in &self.templates {
            templates.validate(language)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SabiaError::Config(format!("{key} has an invalid value: '{value}'")))
}

/// HTTP ingestion endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header, if any.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Public URL registered with `setWebhook` at startup, if any.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_port() -> u16 { 5000 }
fn default_host() -> String { "0.0.0.0".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            webhook_secret: None,
            webhook_url: None,
        }
    }
}

/// Telegram Bot API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_api_base() -> String { "https://api.telegram.org".into() }
fn default_telegram_timeout() -> u64 { 30 }
fn default_poll_interval() -> u64 { 1 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_telegram_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Retrieval policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum cosine score for an answer to be accepted (inclusive).
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Query the encyclopedia when the local corpus has no good match.
    #[serde(default = "bool_true")]
    pub external_lookup: bool,
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
    /// Encyclopedia titles whose sentences are appended to the corpus at startup.
    #[serde(default)]
    pub seed_topics: Vec<String>,
}

fn bool_true() -> bool { true }
fn default_threshold() -> f32 { 0.05 }
fn default_top_k() -> usize { 3 }
fn default_lookup_timeout() -> u64 { 10 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_threshold(),
            top_k: default_top_k(),
            external_lookup: true,
            lookup_timeout_secs: default_lookup_timeout(),
            seed_topics: Vec::new(),
        }
    }
}

/// Voice reply configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Per-producer timeout.
    #[serde(default = "default_voice_timeout")]
    pub timeout_secs: u64,
    /// Hugging Face TTS model per base language.
    #[serde(default = "default_hf_models")]
    pub huggingface_models: BTreeMap<String, String>,
}

fn default_voice_timeout() -> u64 { 60 }
fn default_hf_models() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("en".to_string(), "facebook/mms-tts-eng".to_string()),
        ("pt".to_string(), "facebook/mms-tts-por".to_string()),
    ])
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_voice_timeout(),
            huggingface_models: default_hf_models(),
        }
    }
}

/// Text normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Languages with a dedicated model, preloaded at startup.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Max language models kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub model_cache_capacity: usize,
}

fn default_languages() -> Vec<String> { vec!["en".into(), "pt".into()] }
fn default_language() -> String { "en".into() }
fn default_cache_capacity() -> usize { 3 }

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            default_language: default_language(),
            model_cache_capacity: default_cache_capacity(),
        }
    }
}

/// Word cloud command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordCloudConfig {
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_canvas")]
    pub width: u32,
    #[serde(default = "default_canvas")]
    pub height: u32,
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_render_endpoint")]
    pub endpoint: String,
}

fn default_min_words() -> usize { 7 }
fn default_max_length() -> usize { 4096 }
fn default_canvas() -> u32 { 1024 }
fn default_render_timeout() -> u64 { 30 }
fn default_render_endpoint() -> String { "https://quickchart.io/wordcloud".into() }

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            max_length: default_max_length(),
            width: default_canvas(),
            height: default_canvas(),
            timeout_secs: default_render_timeout(),
            endpoint: default_render_endpoint(),
        }
    }
}

/// Encyclopedia / web lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_wiki_language")]
    pub wiki_language: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Titles are truncated to this many characters before lookup.
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
}

fn default_wiki_language() -> String { "en".into() }
fn default_user_agent() -> String { "SabiaBot/0.2 (https://github.com/sabia-bot/sabia)".into() }
fn default_max_title_len() -> usize { 256 }

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            wiki_language: default_wiki_language(),
            user_agent: default_user_agent(),
            max_title_len: default_max_title_len(),
        }
    }
}

/// Reply framing for one language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguageTemplates {
    /// Prefix for positive sentiment.
    pub positive: String,
    /// Prefix for negative sentiment (empathetic).
    pub negative: String,
    pub neutral: String,
    /// Canned reply when nothing clears the similarity threshold.
    pub no_answer: String,
}

impl LanguageTemplates {
    pub fn prefix(&self, label: SentimentLabel) -> &str {
        match label {
            SentimentLabel::Positive => &self.positive,
            SentimentLabel::Negative => &self.negative,
            SentimentLabel::Neutral => &self.neutral,
        }
    }

    fn validate(&self, language: &str) -> Result<()> {
        for label in SentimentLabel::ALL {
            if self.prefix(label).trim().is_empty() {
                return Err(SabiaError::Template(format!(
                    "missing {label} template for language '{language}'"
                )));
            }
        }
        if self.no_answer.trim().is_empty() {
            return Err(SabiaError::Template(format!(
                "missing no_answer template for language '{language}'"
            )));
        }
        Ok(())
    }
}

fn default_templates() -> BTreeMap<String, LanguageTemplates> {
    BTreeMap::from([
        (
            "en".to_string(),
            LanguageTemplates {
                positive: "That's great! Here's something that might help even more.".into(),
                negative: "I hear you. Let's work through this together.".into(),
                neutral: "Here's what I found.".into(),
                no_answer: "I do not know that yet, but I can keep learning if you give me more context.".into(),
            },
        ),
        (
            "pt".to_string(),
            LanguageTemplates {
                positive: "Que ótimo! Aqui está algo que pode ajudar ainda mais.".into(),
                negative: "Eu entendo. Vamos resolver isso juntos.".into(),
                neutral: "Olhe o que encontrei.".into(),
                no_answer: "Ainda não sei responder isso, mas posso procurar mais informações se você quiser.".into(),
            },
        ),
    ])
}

/// Greeting detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreetingsConfig {
    /// Words that mark a message as a greeting (case-insensitive).
    #[serde(default = "default_greeting_inputs")]
    pub inputs: Vec<String>,
    /// Replies picked at random.
    #[serde(default = "default_greeting_outputs")]
    pub outputs: Vec<String>,
}

fn default_greeting_inputs() -> Vec<String> {
    ["hello", "hi", "hey", "greetings", "olá", "ola", "oi"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_greeting_outputs() -> Vec<String> {
    ["Hello!", "Hi there!", "Hey! Ask me anything about artificial intelligence.", "Olá!"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for GreetingsConfig {
    fn default() -> Self {
        Self {
            inputs: default_greeting_inputs(),
            outputs: default_greeting_outputs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SabiaConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.queue_capacity, None);
        assert!((config.retrieval.similarity_threshold - 0.05).abs() < f32::EPSILON);
        assert!(config.huggingface_token.is_none());
        assert!(config.templates.contains_key("en"));
    }

    #[test]
    fn test_missing_token_fails_fast() {
        let config = SabiaConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SabiaError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SabiaConfig::default();
        config
            .apply_env(env(&[
                ("TELEGRAM_BOT_TOKEN", " 123:abc "),
                ("SABIA_WORKERS", "4"),
                ("PORT", "8080"),
                ("HUGGINGFACE_TOKEN", "hf_x"),
                ("SABIA_QUEUE_CAPACITY", "64"),
                ("SABIA_VOICE_REPLIES", "true"),
            ]))
            .unwrap();
        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.workers, 4);
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.huggingface_token.as_deref(), Some("hf_x"));
        assert_eq!(config.queue_capacity, Some(64));
        assert!(config.voice.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let mut config = SabiaConfig::default();
        config
            .apply_env(env(&[("TELEGRAM_BOT_TOKEN", "t"), ("SABIA_WORKERS", "0")]))
            .unwrap();
        assert_eq!(config.workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_from_file_clamped_to_one() {
        let mut config: SabiaConfig = toml::from_str("telegram_token = \"t\"\nworkers = 0\n").unwrap();
        config.apply_env(env(&[])).unwrap();
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_empty_hf_token_disables_producer() {
        let mut config = SabiaConfig::default();
        config.apply_env(env(&[("HUGGINGFACE_TOKEN", "  ")])).unwrap();
        assert!(config.huggingface_token.is_none());
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = SabiaConfig::default();
        let err = config.apply_env(env(&[("SABIA_WORKERS", "many")])).unwrap_err();
        assert!(err.to_string().contains("SABIA_WORKERS"));
    }

    #[test]
    fn test_incomplete_templates_rejected() {
        let mut config = SabiaConfig::default();
        config.telegram_token = "t".into();
        config.templates.insert(
            "es".into(),
            LanguageTemplates {
                positive: "¡Genial!".into(),
                negative: String::new(),
                neutral: "Esto encontré.".into(),
                no_answer: "No sé.".into(),
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("negative"));
        assert!(err.to_string().contains("es"));
    }

    #[test]
    fn test_default_language_needs_templates() {
        let mut config = SabiaConfig::default();
        config.telegram_token = "t".into();
        config.nlp.default_language = "fr".into();
        assert!(matches!(config.validate(), Err(SabiaError::Template(_))));
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
telegram_token = "abc"
workers = 3

[retrieval]
similarity_threshold = 0.2
seed_topics = ["Artificial intelligence"]

[gateway]
port = 9000
"#,
        )
        .unwrap();
        let config = SabiaConfig::load_from(&path).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.seed_topics.len(), 1);
        assert!(config.validate().is_ok());
    }
}
