//! Sentiment-aware framing of answers.

use std::collections::BTreeMap;

use sabia_core::config::{LanguageTemplates, SabiaConfig};
use sabia_core::types::{SentimentLabel, SentimentResult};

/// Maps `(label, language)` to a prefix and prepends it to an answer.
#[derive(Debug, Clone)]
pub struct ResponseAdapter {
    templates: BTreeMap<String, LanguageTemplates>,
    default_language: String,
}

impl ResponseAdapter {
    pub fn new(templates: BTreeMap<String, LanguageTemplates>, default_language: impl Into<String>) -> Self {
        Self {
            templates,
            default_language: default_language.into(),
        }
    }

    pub fn from_config(config: &SabiaConfig) -> Self {
        Self::new(config.templates.clone(), config.nlp.default_language.clone())
    }

    /// Templates for `language` (region stripped), else the default language's.
    fn templates_for(&self, language: &str) -> Option<&LanguageTemplates> {
        let base = language
            .split(['-', '_'])
            .next()
            .unwrap_or(language)
            .to_lowercase();
        self.templates
            .get(&base)
            .or_else(|| self.templates.get(&self.default_language))
    }

    /// Prefix for a sentiment. Blank entries fall back to neutral; no table at all yields "".
    pub fn prefix(&self, sentiment: &SentimentResult) -> &str {
        let Some(templates) = self.templates_for(&sentiment.language) else {
            return "";
        };
        let prefix = templates.prefix(sentiment.label);
        if prefix.trim().is_empty() {
            templates.prefix(SentimentLabel::Neutral)
        } else {
            prefix
        }
    }

    /// `prefix + " " + base`. Never fails.
    pub fn adapt(&self, base: &str, sentiment: &SentimentResult) -> String {
        let prefix = self.prefix(sentiment).trim();
        if prefix.is_empty() {
            return base.to_string();
        }
        format!("{prefix} {base}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment(label: SentimentLabel, language: &str) -> SentimentResult {
        SentimentResult {
            label,
            score: 0.9,
            language: language.into(),
        }
    }

    fn adapter() -> ResponseAdapter {
        ResponseAdapter::from_config(&SabiaConfig::default())
    }

    #[test]
    fn test_negative_gets_empathetic_prefix() {
        let reply = adapter().adapt("X", &sentiment(SentimentLabel::Negative, "en"));
        assert_eq!(reply, "I hear you. Let's work through this together. X");
    }

    #[test]
    fn test_language_specific_prefix() {
        let reply = adapter().adapt("X", &sentiment(SentimentLabel::Positive, "pt-BR"));
        assert!(reply.starts_with("Que ótimo!"));
        assert!(reply.ends_with(" X"));
    }

    #[test]
    fn test_unknown_language_uses_default() {
        let reply = adapter().adapt("X", &sentiment(SentimentLabel::Neutral, "de"));
        assert_eq!(reply, "Here's what I found. X");
    }

    #[test]
    fn test_blank_template_falls_back_to_neutral() {
        let mut templates = SabiaConfig::default().templates;
        if let Some(en) = templates.get_mut("en") {
            en.positive = "  ".into();
        }
        let adapter = ResponseAdapter::new(templates, "en");
        let reply = adapter.adapt("X", &sentiment(SentimentLabel::Positive, "en"));
        assert_eq!(reply, "Here's what I found. X");
    }

    #[test]
    fn test_no_templates_returns_answer_unchanged() {
        let adapter = ResponseAdapter::new(BTreeMap::new(), "en");
        assert_eq!(adapter.adapt("X", &sentiment(SentimentLabel::Negative, "en")), "X");
    }
}
