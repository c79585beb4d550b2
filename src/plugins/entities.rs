//! Keyword entity extraction backed by RAKE scoring

use super::{Entity, EntityExtractor};
use crate::extract::rake_keywords;
use crate::{Document, Result};

/// Ranks key phrases of the visible text and keeps the strongest ones
#[derive(Debug, Clone)]
pub struct KeywordEntityExtractor {
    /// Phrases scoring below this are dropped
    pub min_score: f64,

    /// At most this many top-ranked phrases are considered
    pub max_keywords: usize,
}

impl Default for KeywordEntityExtractor {
    fn default() -> Self {
        Self {
            min_score: 1.5,
            max_keywords: 20,
        }
    }
}

impl EntityExtractor for KeywordEntityExtractor {
    fn extract(&self, document: &Document) -> Result<Vec<Entity>> {
        let text = document.visible_text().to_lowercase();
        let word_count = text.split_whitespace().count();
        if word_count == 0 {
            return Ok(Vec::new());
        }

        let entities = rake_keywords(&text)
            .into_iter()
            .take(self.max_keywords)
            .filter(|phrase| phrase.score >= self.min_score)
            .map(|phrase| {
                let occurrences = text.matches(phrase.phrase.as_str()).count();
                Entity {
                    density: occurrences as f64 / word_count as f64 * 100.0,
                    keyword: phrase.phrase,
                    score: phrase.score,
                }
            })
            .collect();

        Ok(entities)
    }
}
