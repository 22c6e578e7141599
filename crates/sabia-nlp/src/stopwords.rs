//! Stop-word tables. Also used as the language-detection profile.

pub const ENGLISH: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "done", "down", "during", "each",
    "either", "else", "ever", "every", "few", "for", "from", "further", "get", "had", "has",
    "have", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "however", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "let", "ll", "me",
    "might", "more", "most", "much", "must", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "please", "re", "really", "s", "same", "she", "should", "so", "some", "such", "t", "tell",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "us", "ve", "very",
    "was", "we", "were", "what", "when", "where", "whether", "which", "while", "who", "whom",
    "why", "will", "with", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

pub const PORTUGUESE: &[&str] = &[
    "a", "ao", "aos", "aquela", "aquele", "aqueles", "aquilo", "as", "até", "com", "como", "da",
    "das", "de", "dela", "dele", "deles", "depois", "do", "dos", "e", "é", "ela", "elas", "ele",
    "eles", "em", "entre", "era", "eram", "essa", "essas", "esse", "esses", "esta", "está",
    "estão", "estas", "este", "estes", "eu", "foi", "foram", "há", "isso", "isto", "já", "lhe",
    "lhes", "mais", "mas", "me", "mesmo", "meu", "minha", "muito", "na", "nas", "nem", "no",
    "nos", "nós", "nossa", "nosso", "num", "numa", "o", "os", "ou", "para", "pela", "pelas",
    "pelo", "pelos", "por", "porque", "qual", "quando", "que", "quem", "se", "sem", "ser", "seu",
    "seus", "só", "sua", "suas", "são", "também", "te", "tem", "têm", "tu", "um", "uma", "umas",
    "uns", "você", "vocês", "vos",
];

/// Stop words for a base language code, if the language is known.
pub fn for_language(code: &str) -> Option<&'static [&'static str]> {
    match code {
        "en" => Some(ENGLISH),
        "pt" => Some(PORTUGUESE),
        _ => None,
    }
}

/// Language codes with dedicated tables.
pub const SUPPORTED: &[&str] = &["en", "pt"];
