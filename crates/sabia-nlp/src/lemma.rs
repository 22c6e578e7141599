//! Rule-based lemmatizers.
//!
//! Suffix rules only; the goal is that inflected forms in the corpus and
//! the query land on the same key, not dictionary-correct lemmas.

/// Lemmatization strategy for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lemmatizer {
    English,
    Portuguese,
    /// Multilingual fallback: lowercase only.
    Identity,
}

impl Lemmatizer {
    pub fn for_language(code: &str) -> Self {
        match code {
            "en" => Lemmatizer::English,
            "pt" => Lemmatizer::Portuguese,
            _ => Lemmatizer::Identity,
        }
    }

    /// Lemmatize an already-lowercased word.
    pub fn lemma(&self, word: &str) -> String {
        match self {
            Lemmatizer::English => english(word),
            Lemmatizer::Portuguese => portuguese(word),
            Lemmatizer::Identity => word.to_string(),
        }
    }
}

const ENGLISH_IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("made", "make"),
    ("thought", "think"),
    ("taught", "teach"),
    ("learnt", "learn"),
    ("data", "datum"),
];

fn english(word: &str) -> String {
    if let Some((_, lemma)) = ENGLISH_IRREGULAR.iter().find(|(w, _)| *w == word) {
        return (*lemma).to_string();
    }
    let n = word.chars().count();
    if n <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if n > 4 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("ied") {
        return format!("{stem}y");
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if stem.chars().count() >= 3 {
            return undouble(stem);
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if stem.chars().count() >= 4 {
            return undouble(stem);
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// "runn" → "run", but keep "ll"/"ss"/"zz" ("fall", "pass").
fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 1] == chars[n - 2] && !matches!(chars[n - 1], 'l' | 's' | 'z' | 'a' | 'e' | 'i' | 'o' | 'u') {
        chars[..n - 1].iter().collect()
    } else {
        stem.to_string()
    }
}

fn portuguese(word: &str) -> String {
    let n = word.chars().count();
    if n <= 3 {
        return word.to_string();
    }
    for (suffix, replacement) in [("ções", "ção"), ("ões", "ão"), ("ães", "ão"), ("ais", "al"), ("éis", "el"), ("eis", "el"), ("ns", "m")] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{replacement}");
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.ends_with(['a', 'e', 'o', 'á', 'é', 'ó', 'ê', 'ô']) {
            return stem.to_string();
        }
    }
    word.to_string()
}
