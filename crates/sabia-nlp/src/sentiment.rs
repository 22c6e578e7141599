//! Lexicon sentiment scoring with negation flipping.

use std::collections::HashSet;

use sabia_core::types::{SentimentLabel, SentimentResult};

use crate::text::words;

const EN_POSITIVE: &[&str] = &[
    "amazing", "awesome", "beautiful", "best", "better", "brilliant", "cool", "excellent", "fantastic",
    "fun", "glad", "good", "great", "happy", "helpful", "interesting", "like", "love", "loved", "nice",
    "perfect", "pleased", "thank", "thanks", "useful", "wonderful",
];

const EN_NEGATIVE: &[&str] = &[
    "angry", "annoying", "awful", "bad", "boring", "broken", "confused", "confusing", "disappointed",
    "frustrated", "hate", "hated", "horrible", "poor", "sad", "stupid", "terrible", "ugly", "upset",
    "useless", "worse", "worst", "wrong",
];

const EN_NEGATORS: &[&str] = &["not", "no", "never", "don", "doesn", "didn", "isn", "wasn", "aren", "cannot", "nothing"];

const PT_POSITIVE: &[&str] = &[
    "adoro", "amei", "bem", "boa", "bom", "bonito", "ótimo", "ótima", "excelente", "feliz", "gosto",
    "incrível", "interessante", "legal", "maravilhoso", "melhor", "obrigado", "obrigada", "perfeito",
    "útil",
];

const PT_NEGATIVE: &[&str] = &[
    "chato", "confuso", "errado", "horrível", "infeliz", "inútil", "odeio", "péssimo", "pior",
    "raiva", "ruim", "terrível", "triste", "zangado",
];

const PT_NEGATORS: &[&str] = &["não", "nunca", "nem", "jamais", "nada", "nenhum", "nenhuma"];

/// Sentiment vocabulary of one language.
#[derive(Debug, Default)]
pub struct Lexicon {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negators: HashSet<&'static str>,
}

impl Lexicon {
    /// Lexicon for a base code; unknown codes (and the multilingual model) get every table.
    pub fn for_language(code: &str) -> Self {
        let tables: &[(&[&'static str], &[&'static str], &[&'static str])] = match code {
            "en" => &[(EN_POSITIVE, EN_NEGATIVE, EN_NEGATORS)],
            "pt" => &[(PT_POSITIVE, PT_NEGATIVE, PT_NEGATORS)],
            _ => &[(EN_POSITIVE, EN_NEGATIVE, EN_NEGATORS), (PT_POSITIVE, PT_NEGATIVE, PT_NEGATORS)],
        };
        let mut lexicon = Lexicon::default();
        for (pos, neg, not) in tables {
            lexicon.positive.extend(pos.iter().copied());
            lexicon.negative.extend(neg.iter().copied());
            lexicon.negators.extend(not.iter().copied());
        }
        lexicon
    }
}

/// Counts positive and negative hits; a negator flips the next hit within the window.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    negation_window: usize,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self { negation_window: 3 }
    }
}

impl SentimentAnalyzer {
    pub fn analyze(&self, lexicon: &Lexicon, text: &str, language: &str) -> SentimentResult {
        let mut positive = 0u32;
        let mut negative = 0u32;
        let mut negated_for = 0usize;

        for word in words(text) {
            let word = word.to_lowercase();
            let w = word.as_str();
            if lexicon.negators.contains(w) {
                negated_for = self.negation_window;
                continue;
            }
            let polarity = if lexicon.positive.contains(w) {
                Some(true)
            } else if lexicon.negative.contains(w) {
                Some(false)
            } else {
                None
            };
            match polarity {
                Some(p) => {
                    let p = if negated_for > 0 { !p } else { p };
                    if p {
                        positive += 1;
                    } else {
                        negative += 1;
                    }
                    negated_for = 0;
                }
                None => negated_for = negated_for.saturating_sub(1),
            }
        }

        let total = (positive + negative) as f32;
        if positive > negative {
            SentimentResult {
                label: SentimentLabel::Positive,
                score: positive as f32 / total,
                language: language.to_string(),
            }
        } else if negative > positive {
            SentimentResult {
                label: SentimentLabel::Negative,
                score: negative as f32 / total,
                language: language.to_string(),
            }
        } else {
            SentimentResult::neutral(language)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en(text: &str) -> SentimentResult {
        SentimentAnalyzer::default().analyze(&Lexicon::for_language("en"), text, "en")
    }

    #[test]
    fn test_positive_and_negative() {
        let r = en("This bot is great, I love it");
        assert_eq!(r.label, SentimentLabel::Positive);
        assert!((r.score - 1.0).abs() < 1e-6);
        assert_eq!(en("this is terrible and useless").label, SentimentLabel::Negative);
    }

    #[test]
    fn test_negation_flips() {
        assert_eq!(en("this is not good").label, SentimentLabel::Negative);
        assert_eq!(en("I don't hate it").label, SentimentLabel::Positive);
        // Too far from the negator.
        assert_eq!(en("not that it matters much here good").label, SentimentLabel::Positive);
    }

    #[test]
    fn test_neutral() {
        let r = en("What is artificial intelligence?");
        assert_eq!(r.label, SentimentLabel::Neutral);
        assert_eq!(r.language, "en");
        assert_eq!(en("good but bad").label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_portuguese() {
        let lex = Lexicon::for_language("pt");
        let a = SentimentAnalyzer::default();
        assert_eq!(a.analyze(&lex, "Isso é péssimo", "pt").label, SentimentLabel::Negative);
        assert_eq!(a.analyze(&lex, "não é ruim", "pt").label, SentimentLabel::Positive);
        assert_eq!(a.analyze(&lex, "muito obrigado", "pt").label, SentimentLabel::Positive);
    }

    #[test]
    fn test_score_in_unit_range() {
        let r = en("good great bad");
        assert_eq!(r.label, SentimentLabel::Positive);
        assert!(r.score > 0.5 && r.score <= 1.0);
    }
}
