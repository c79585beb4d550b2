//! RAKE (Rapid Automatic Keyword Extraction)
//!
//! Candidate phrases are runs of words delimited by punctuation and stopwords. Each
//! word scores `degree / frequency`, where degree counts the words it co-occurs with
//! in candidate phrases (itself included). A phrase scores the sum of its words.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

// Anything that is not a word character, whitespace, apostrophe or hyphen ends a phrase
static PHRASE_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s'\-]+").expect("Invalid phrase delimiter pattern"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an",
        "and", "any", "are", "aren't", "as", "at", "be", "because", "been", "before",
        "being", "below", "between", "both", "but", "by", "can", "cannot", "could",
        "did", "do", "does", "doing", "don't", "down", "during", "each", "either",
        "else", "ever", "every", "few", "for", "from", "further", "get", "got", "had",
        "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
        "himself", "his", "how", "however", "i", "if", "in", "into", "is", "isn't",
        "it", "it's", "its", "itself", "just", "let", "like", "may", "me", "might",
        "more", "most", "much", "must", "my", "myself", "neither", "no", "nor", "not",
        "now", "of", "off", "on", "once", "only", "or", "other", "ought", "our",
        "ours", "ourselves", "out", "over", "own", "same", "say", "says", "she",
        "should", "since", "so", "some", "such", "than", "that", "that's", "the",
        "their", "theirs", "them", "themselves", "then", "there", "these", "they",
        "this", "those", "through", "thus", "to", "too", "under", "until", "up",
        "upon", "us", "very", "was", "wasn't", "we", "were", "what", "when", "where",
        "whether", "which", "while", "who", "whom", "whose", "why", "will", "with",
        "within", "without", "would", "yet", "you", "your", "yours", "yourself",
        "yourselves",
    ]
    .into_iter()
    .collect()
});

/// A candidate phrase with its RAKE score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPhrase {
    pub phrase: String,
    pub score: f64,
}

/// Returns true for words that break candidate phrases
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Scores candidate phrases in `text`, highest first
///
/// Phrases are lowercased and deduplicated; equal scores keep first-occurrence order.
///
/// # Example
///
/// ```
/// use pagesift::extract::rake_keywords;
///
/// let ranked = rake_keywords("Rust compiler errors are helpful. The compiler is fast.");
/// assert_eq!(ranked[0].phrase, "rust compiler errors");
/// ```
pub fn rake_keywords(text: &str) -> Vec<ScoredPhrase> {
    let phrases = candidate_phrases(&text.to_lowercase());

    let mut frequency: HashMap<&str, f64> = HashMap::new();
    let mut degree: HashMap<&str, f64> = HashMap::new();
    for phrase in &phrases {
        let len = phrase.len() as f64;
        for word in phrase {
            *frequency.entry(word.as_str()).or_default() += 1.0;
            *degree.entry(word.as_str()).or_default() += len;
        }
    }

    let word_score = |word: &str| -> f64 {
        let freq = frequency.get(word).copied().unwrap_or(1.0);
        degree.get(word).copied().unwrap_or(0.0) / freq
    };

    let mut seen = HashSet::new();
    let mut scored = Vec::new();
    for phrase in &phrases {
        let joined = phrase.join(" ");
        if !seen.insert(joined.clone()) {
            continue;
        }
        let score: f64 = phrase.iter().map(|w| word_score(w.as_str())).sum();
        scored.push(ScoredPhrase {
            phrase: joined,
            score,
        });
    }

    // Stable sort keeps first occurrence ahead among ties
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Splits lowercased text into candidate phrases (lists of words)
fn candidate_phrases(text: &str) -> Vec<Vec<String>> {
    let mut phrases = Vec::new();

    for fragment in PHRASE_DELIMITER.split(text) {
        let mut current: Vec<String> = Vec::new();
        for raw in fragment.split_whitespace() {
            let word = raw.trim_matches(|c| c == '\'' || c == '-');
            let breaks_phrase = word.is_empty()
                || is_stopword(word)
                || word.chars().all(|c| c.is_numeric());

            if breaks_phrase {
                if !current.is_empty() {
                    phrases.push(std::mem::take(&mut current));
                }
            } else {
                current.push(word.to_string());
            }
        }
        if !current.is_empty() {
            phrases.push(current);
        }
    }

    phrases
}
