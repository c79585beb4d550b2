//! `<meta>` tag classification into standard, Open Graph and Twitter partitions

use crate::document::parse_selector;
use crate::{Document, ScrapeError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which map a meta entry belongs to, decided by name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaPartition {
    Standard,
    Og,
    Twitter,
}

impl MetaPartition {
    /// Classifies a meta name: `og:` and `twitter:` prefixes, else standard
    pub fn classify(name: &str) -> Self {
        if name.starts_with("og:") {
            MetaPartition::Og
        } else if name.starts_with("twitter:") {
            MetaPartition::Twitter
        } else {
            MetaPartition::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetaPartition::Standard => "standard",
            MetaPartition::Og => "og",
            MetaPartition::Twitter => "twitter",
        }
    }
}

impl fmt::Display for MetaPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetaPartition {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(MetaPartition::Standard),
            "og" => Ok(MetaPartition::Og),
            "twitter" => Ok(MetaPartition::Twitter),
            other => Err(ScrapeError::InvalidFilter(format!(
                "unknown meta partition '{}'",
                other
            ))),
        }
    }
}

/// Classified metadata of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaBag {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub standard: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub og: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub twitter: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
}

impl MetaBag {
    /// Returns the map for a partition
    pub fn partition(&self, partition: MetaPartition) -> &BTreeMap<String, String> {
        match partition {
            MetaPartition::Standard => &self.standard,
            MetaPartition::Og => &self.og,
            MetaPartition::Twitter => &self.twitter,
        }
    }

    fn partition_mut(&mut self, partition: MetaPartition) -> &mut BTreeMap<String, String> {
        match partition {
            MetaPartition::Standard => &mut self.standard,
            MetaPartition::Og => &mut self.og,
            MetaPartition::Twitter => &mut self.twitter,
        }
    }

    /// Returns true when nothing was found
    pub fn is_empty(&self) -> bool {
        self.standard.is_empty()
            && self.og.is_empty()
            && self.twitter.is_empty()
            && self.charset.is_none()
            && self.viewport.is_none()
    }
}

/// Extracts `meta` elements into a [`MetaBag`]
#[derive(Debug, Clone)]
pub struct MetaExtractor<'a> {
    document: &'a Document,
    partition: Option<MetaPartition>,
}

impl<'a> MetaExtractor<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            partition: None,
        }
    }

    /// Keeps only one partition; the others stay empty
    ///
    /// `charset` and `viewport` are unaffected.
    pub fn partition(mut self, partition: MetaPartition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn extract(&self) -> MetaBag {
        let mut bag = MetaBag::default();
        let Ok(selector) = parse_selector("meta") else {
            return bag;
        };

        for element in self.document.html().select(&selector) {
            let attrs = element.value();
            let name = attrs
                .attr("name")
                .filter(|n| !n.is_empty())
                .or_else(|| attrs.attr("property"))
                .unwrap_or_default();
            let content = attrs.attr("content").unwrap_or_default();

            if name.is_empty() {
                if let Some(charset) = attrs.attr("charset").filter(|c| !c.is_empty()) {
                    bag.charset = Some(charset.to_string());
                }
                continue;
            }

            if name.eq_ignore_ascii_case("viewport") {
                if !content.is_empty() {
                    bag.viewport = Some(content.to_string());
                }
                continue;
            }

            if content.is_empty() {
                continue;
            }

            let partition = MetaPartition::classify(name);
            if self.partition.map_or(false, |wanted| wanted != partition) {
                continue;
            }

            bag.partition_mut(partition)
                .insert(name.to_string(), content.to_string());
        }

        bag
    }
}
