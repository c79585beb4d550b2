//! Structural extractors over a parsed [`Document`](crate::Document)
//!
//! Each extractor borrows the document, accepts optional filters through builder
//! methods, and produces serializable records from `extract()`. No filter means
//! everything is included.

mod content;
mod images;
mod keywords;
mod links;
mod meta;
mod structured;

pub use content::{
    ContentBundle, ContentExtractor, ContentKind, Heading, ListBlock, OutlineEntry,
    word_density, WordDensity,
};
pub use images::{
    ImageData, ImageExtractor, ImageProcessor, ImageRecord, SrcsetEntry,
};
pub use keywords::{rake_keywords, ScoredPhrase};
pub use links::{LinkExtractor, LinkRecord};
pub use meta::{MetaBag, MetaExtractor, MetaPartition};
pub use structured::{MicrodataItem, RdfaEntry, StructuredData, StructuredDataExtractor};

use scraper::ElementRef;
use std::collections::BTreeMap;

/// Attribute-equality filter: every listed attribute must be present with exactly
/// the given value
pub type AttributeFilter = BTreeMap<String, String>;

/// Returns true when the element satisfies every attribute-equality filter
pub(crate) fn matches_attributes(element: &ElementRef<'_>, filter: &AttributeFilter) -> bool {
    filter
        .iter()
        .all(|(name, value)| element.value().attr(name) == Some(value.as_str()))
}

/// Reads a non-empty attribute value
pub(crate) fn non_empty_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}
