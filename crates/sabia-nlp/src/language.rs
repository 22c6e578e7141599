//! Language detection by stop-word profile.
//!
//! Short chat messages give statistical detectors little to work with; the
//! share of a language's function words is a stable signal at this length.
//! No signal (or a tie) means the default language.

use std::collections::HashSet;

use crate::stopwords;
use crate::text::words;

/// Reduce a language tag to its base code: `pt-BR` → `pt`.
pub fn base_code(code: &str) -> String {
    code.split(['-', '_'])
        .next()
        .unwrap_or(code)
        .trim()
        .to_lowercase()
}

struct Profile {
    code: String,
    words: HashSet<&'static str>,
    /// Characters that only occur in this language among the candidates.
    marks: &'static [char],
}

pub struct LanguageDetector {
    profiles: Vec<Profile>,
    default_language: String,
}

impl LanguageDetector {
    /// Build profiles for the languages that have stop-word tables; others are skipped.
    pub fn new(languages: &[String], default_language: &str) -> Self {
        let profiles = languages
            .iter()
            .map(|l| base_code(l))
            .filter_map(|code| {
                let table = stopwords::for_language(&code)?;
                Some(Profile {
                    marks: marks_for(&code),
                    words: table.iter().copied().collect(),
                    code,
                })
            })
            .collect();
        Self {
            profiles,
            default_language: base_code(default_language),
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn detect(&self, text: &str) -> String {
        let tokens: Vec<String> = words(text).map(|w| w.to_lowercase()).collect();
        if tokens.is_empty() {
            return self.default_language.clone();
        }

        let mut best: Option<(&str, f32)> = None;
        let mut tie = false;
        for profile in &self.profiles {
            let hits = tokens
                .iter()
                .filter(|t| profile.words.contains(t.as_str()))
                .count() as f32;
            let marks = text
                .chars()
                .filter(|c| profile.marks.contains(&c.to_lowercase().next().unwrap_or(*c)))
                .count() as f32;
            let score = (hits + marks) / tokens.len() as f32;
            match best {
                Some((_, s)) if (score - s).abs() < f32::EPSILON => tie = true,
                Some((_, s)) if score < s => {}
                _ => {
                    best = Some((&profile.code, score));
                    tie = false;
                }
            }
        }

        match best {
            Some((code, score)) if score > 0.0 && !tie => code.to_string(),
            _ => {
                tracing::debug!("Language detection inconclusive, falling back to '{}'", self.default_language);
                self.default_language.clone()
            }
        }
    }
}

fn marks_for(code: &str) -> &'static [char] {
    match code {
        "pt" => &['ã', 'õ', 'ç', 'â', 'ê', 'ô'],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> LanguageDetector {
        LanguageDetector::new(&["en".into(), "pt-BR".into()], "en")
    }

    #[test]
    fn test_base_code() {
        assert_eq!(base_code("pt-BR"), "pt");
        assert_eq!(base_code("EN_us"), "en");
        assert_eq!(base_code("en"), "en");
    }

    #[test]
    fn test_detect_english() {
        assert_eq!(detector().detect("What is the meaning of this?"), "en");
    }

    #[test]
    fn test_detect_portuguese() {
        assert_eq!(detector().detect("O que é inteligência artificial para você?"), "pt");
        assert_eq!(detector().detect("Não entendi a explicação"), "pt");
    }

    #[test]
    fn test_no_signal_falls_back() {
        assert_eq!(detector().detect(""), "en");
        assert_eq!(detector().detect("   "), "en");
        assert_eq!(detector().detect("xyzzy plugh"), "en");
    }

    #[test]
    fn test_unknown_languages_are_skipped() {
        let d = LanguageDetector::new(&["fr".into()], "pt");
        assert_eq!(d.detect("le chat est noir"), "pt");
    }
}
