//! Image extraction with srcset parsing and optional binary processing

use super::{matches_attributes, non_empty_attr, AttributeFilter};
use crate::document::parse_selector;
use crate::{Document, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output of an [`ImageProcessor`] for a single image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageData {
    /// Non-empty EXIF tags
    pub exif: BTreeMap<String, String>,

    /// Thumbnail encoded as a data URL
    pub thumbnail: Option<String>,
}

/// Fetches and inspects image binaries (EXIF, thumbnails)
///
/// Decoding lives outside this crate; implementations wrap whatever imaging backend
/// the host provides.
pub trait ImageProcessor {
    fn process(&self, src: &str) -> Result<ImageData>;
}

/// One candidate from a `srcset` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SrcsetEntry {
    pub url: String,

    /// Width or density descriptor such as `480w` or `2x`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
}

/// An image found in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// `src`, or `data-src` for lazily loaded images; not resolved
    pub src: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub srcset: Vec<SrcsetEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Extracts `img` elements as [`ImageRecord`]s
pub struct ImageExtractor<'a> {
    document: &'a Document,
    attributes: AttributeFilter,
    min_dimensions: Option<(u32, u32)>,
    processor: Option<&'a dyn ImageProcessor>,
}

impl<'a> ImageExtractor<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            attributes: AttributeFilter::new(),
            min_dimensions: None,
            processor: None,
        }
    }

    /// Keeps only images whose `name` attribute equals `value`
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Excludes images with a declared width or height below the minimum
    ///
    /// Images that declare no dimension are kept.
    pub fn min_dimensions(mut self, width: u32, height: u32) -> Self {
        self.min_dimensions = Some((width, height));
        self
    }

    /// Runs each kept image through a processor for EXIF and thumbnail data
    pub fn processor(mut self, processor: &'a dyn ImageProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Runs the extraction in document order
    pub fn extract(&self) -> Vec<ImageRecord> {
        let Ok(selector) = parse_selector("img") else {
            return Vec::new();
        };

        let mut images = Vec::new();

        for element in self.document.html().select(&selector) {
            let Some(src) =
                non_empty_attr(&element, "src").or_else(|| non_empty_attr(&element, "data-src"))
            else {
                continue;
            };

            let width = element.value().attr("width").and_then(parse_dimension);
            let height = element.value().attr("height").and_then(parse_dimension);

            if let Some((min_width, min_height)) = self.min_dimensions {
                let too_narrow = width.map_or(false, |w| w < min_width);
                let too_short = height.map_or(false, |h| h < min_height);
                if too_narrow || too_short {
                    continue;
                }
            }

            if !matches_attributes(&element, &self.attributes) {
                continue;
            }

            let srcset = element
                .value()
                .attr("srcset")
                .map(parse_srcset)
                .unwrap_or_default();

            let processed = self.processor.and_then(|p| match p.process(src) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!("Image processing failed for {}: {}", src, e);
                    None
                }
            });
            let (exif, thumbnail) = match processed {
                Some(data) => ((!data.exif.is_empty()).then_some(data.exif), data.thumbnail),
                None => (None, None),
            };

            images.push(ImageRecord {
                src: src.to_string(),
                alt: non_empty_attr(&element, "alt").map(str::to_string),
                width,
                height,
                srcset,
                title: non_empty_attr(&element, "title").map(str::to_string),
                exif,
                thumbnail,
            });
        }

        images
    }
}

/// Reads the leading digits of a dimension attribute; zero counts as absent
fn parse_dimension(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok().filter(|&n| n > 0)
}

/// Splits a `srcset` attribute into candidates
pub(crate) fn parse_srcset(srcset: &str) -> Vec<SrcsetEntry> {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            Some(SrcsetEntry {
                url: url.to_string(),
                descriptor: parts.next().map(str::to_string),
            })
        })
        .collect()
}
