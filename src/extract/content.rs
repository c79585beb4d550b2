//! Textual content analysis: headings, paragraphs, lists, tables, keywords, outline

use super::keywords::{rake_keywords, ScoredPhrase};
use crate::document::{collapse_whitespace, element_text, parse_selector};
use crate::{Document, ScrapeError};
use once_cell::unsync::OnceCell;
use scraper::ElementRef;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Content category selectable through [`ContentExtractor::kind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Headings,
    Paragraphs,
    Lists,
    Tables,
    /// Ranked keywords together with the keyword density table
    Keywords,
    Outline,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Headings => "headings",
            ContentKind::Paragraphs => "paragraphs",
            ContentKind::Lists => "lists",
            ContentKind::Tables => "tables",
            ContentKind::Keywords => "keywords",
            ContentKind::Outline => "outline",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "headings" => Ok(ContentKind::Headings),
            "paragraphs" => Ok(ContentKind::Paragraphs),
            "lists" => Ok(ContentKind::Lists),
            "tables" => Ok(ContentKind::Tables),
            "keywords" => Ok(ContentKind::Keywords),
            "outline" => Ok(ContentKind::Outline),
            other => Err(ScrapeError::InvalidFilter(format!(
                "unknown content kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Tag name, `h1` through `h6`
    pub tag: String,
    pub text: String,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListBlock {
    /// `ul` or `ol`
    #[serde(rename = "type")]
    pub list_type: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
}

/// Occurrences of a word and its share of all words, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WordDensity {
    pub count: usize,
    pub density: f64,
}

/// Result of a content extraction; empty categories are omitted when serialized
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentBundle {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<Heading>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<ListBlock>,

    /// Tables as rows of cell texts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Vec<Vec<String>>>,

    /// Keyword phrases, best first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outline: Vec<OutlineEntry>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub keyword_density: BTreeMap<String, WordDensity>,
}

/// Extracts a [`ContentBundle`] from a document
///
/// Keyword ranking runs at most once per extractor.
pub struct ContentExtractor<'a> {
    document: &'a Document,
    kind: Option<ContentKind>,
    keywords: OnceCell<Vec<ScoredPhrase>>,
}

impl<'a> ContentExtractor<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            kind: None,
            keywords: OnceCell::new(),
        }
    }

    /// Restricts extraction to one category
    pub fn kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn wants(&self, kind: ContentKind) -> bool {
        self.kind.map_or(true, |k| k == kind)
    }

    pub fn extract(&self) -> ContentBundle {
        let mut bundle = ContentBundle::default();

        if self.wants(ContentKind::Headings) || self.wants(ContentKind::Outline) {
            let headings = self.headings();
            if self.wants(ContentKind::Outline) {
                bundle.outline = headings
                    .iter()
                    .map(|h| OutlineEntry {
                        level: h.level,
                        text: h.text.clone(),
                    })
                    .collect();
            }
            if self.wants(ContentKind::Headings) {
                bundle.headings = headings;
            }
        }

        if self.wants(ContentKind::Paragraphs) {
            bundle.paragraphs = self.paragraphs();
        }
        if self.wants(ContentKind::Lists) {
            bundle.lists = self.lists();
        }
        if self.wants(ContentKind::Tables) {
            bundle.tables = self.tables();
        }
        if self.wants(ContentKind::Keywords) {
            bundle.keywords = self.keywords().iter().map(|p| p.phrase.clone()).collect();
            bundle.keyword_density = self.keyword_density();
        }

        bundle
    }

    /// Ranked keyword phrases over the full document text, computed on first use
    pub fn keywords(&self) -> &[ScoredPhrase] {
        self.keywords
            .get_or_init(|| rake_keywords(&self.document.full_text()))
    }

    /// Word counts and densities over the full document text
    ///
    /// Punctuation is stripped and words are lowercased before counting.
    pub fn keyword_density(&self) -> BTreeMap<String, WordDensity> {
        word_density(&self.document.full_text())
    }

    pub fn headings(&self) -> Vec<Heading> {
        self.select_each("h1, h2, h3, h4, h5, h6", |element| {
            let tag = element.value().name().to_string();
            let level = tag[1..].parse().unwrap_or(1);
            Some(Heading {
                text: element_text(&element),
                tag,
                level,
            })
        })
    }

    pub fn paragraphs(&self) -> Vec<String> {
        self.select_each("p", |element| {
            let text = element_text(&element);
            (!text.is_empty()).then_some(text)
        })
    }

    pub fn lists(&self) -> Vec<ListBlock> {
        self.select_each("ul, ol", |element| {
            let items: Vec<String> = child_elements(element, &["li"])
                .map(|li| element_text(&li))
                .collect();
            (!items.is_empty()).then(|| ListBlock {
                list_type: element.value().name().to_string(),
                items,
            })
        })
    }

    pub fn tables(&self) -> Vec<Vec<Vec<String>>> {
        let Ok(row_selector) = parse_selector("tr") else {
            return Vec::new();
        };

        self.select_each("table", |table| {
            let rows: Vec<Vec<String>> = table
                .select(&row_selector)
                .filter_map(|row| {
                    let cells: Vec<String> = child_elements(row, &["th", "td"])
                        .map(|cell| element_text(&cell))
                        .collect();
                    (!cells.is_empty()).then_some(cells)
                })
                .collect();
            (!rows.is_empty()).then_some(rows)
        })
    }

    fn select_each<T>(&self, selector: &str, f: impl FnMut(ElementRef<'a>) -> Option<T>) -> Vec<T> {
        match parse_selector(selector) {
            Ok(selector) => self.document.html().select(&selector).filter_map(f).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Direct element children with one of the given tag names
fn child_elements<'a>(
    parent: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}

/// Counts lowercase, punctuation-free words and their percentage of the total
pub fn word_density(text: &str) -> BTreeMap<String, WordDensity> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let cleaned = collapse_whitespace(&cleaned.to_lowercase());

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for word in cleaned.split(' ').filter(|w| !w.is_empty()) {
        *counts.entry(word.to_string()).or_default() += 1;
        total += 1;
    }

    counts
        .into_iter()
        .map(|(word, count)| {
            let density = count as f64 / total as f64 * 100.0;
            (word, WordDensity { count, density })
        })
        .collect()
}
