//! Parsed HTML document model
//!
//! A [`Document`] pairs a parsed HTML tree with the absolute URL it was loaded from.
//! Extractors query it through CSS selectors; relative references are resolved
//! against the base URL.

use crate::{Result, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the rendered page
const HIDDEN_TEXT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Parses a CSS selector, mapping failures to [`ScrapeError::InvalidSelector`]
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// A parsed HTML page together with its base URL
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
    base_url: Url,
}

impl Document {
    /// Parses an HTML string loaded from `base_url`
    ///
    /// # Example
    ///
    /// ```
    /// use pagesift::Document;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.com/").unwrap();
    /// let doc = Document::parse("<title>Hi</title>", base);
    /// assert_eq!(doc.title(), Some("Hi".to_string()));
    /// ```
    pub fn parse(html: &str, base_url: Url) -> Self {
        Self {
            html: Html::parse_document(html),
            base_url,
        }
    }

    /// Returns the URL the document was loaded from
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the underlying parsed tree
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Returns every element matching a CSS selector, in document order
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    /// Returns the trimmed text of every element matching a selector
    pub fn select_text(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self
            .select(selector)?
            .into_iter()
            .map(|element| element_text(&element))
            .collect())
    }

    /// Returns the value of `attr` on every matching element that carries it
    pub fn select_attr(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        Ok(self
            .select(selector)?
            .into_iter()
            .filter_map(|element| element.value().attr(attr).map(str::to_string))
            .collect())
    }

    /// Returns the page title from the `<title>` tag
    pub fn title(&self) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        self.html
            .select(&title_selector)
            .next()
            .map(|element| element_text(&element))
            .filter(|s| !s.is_empty())
    }

    /// Returns the text a reader would see: text nodes of `<body>` (or the whole tree
    /// when there is no body), skipping script, style, noscript and template content,
    /// with whitespace collapsed
    pub fn visible_text(&self) -> String {
        let body_selector = Selector::parse("body").ok();
        let root = body_selector
            .as_ref()
            .and_then(|body| self.html.select(body).next())
            .unwrap_or_else(|| self.html.root_element());

        text_outside_hidden(root)
    }

    /// Returns the text of the whole document, `<head>` included
    ///
    /// Script, style, noscript and template content is still skipped.
    pub fn full_text(&self) -> String {
        text_outside_hidden(self.html.root_element())
    }

    /// Serializes the document back to HTML
    pub fn to_html(&self) -> String {
        self.html.html()
    }

    /// Injects an HTML fragment at the end of `<body>` and re-parses the tree
    ///
    /// Used when an external renderer produces nodes that the static fetch lacked.
    pub fn merge_fragment(&mut self, fragment: &str) {
        let mut source = self.to_html();
        let insert_at = source.to_ascii_lowercase().rfind("</body>");

        match insert_at {
            Some(index) => source.insert_str(index, fragment),
            None => source.push_str(fragment),
        }

        tracing::debug!(
            "Merged {} bytes of markup into {}",
            fragment.len(),
            self.base_url
        );
        self.html = Html::parse_document(&source);
    }
}

/// Returns an element's descendant text, trimmed with whitespace collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(""))
}

/// Collapses whitespace runs to single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_outside_hidden(root: ElementRef<'_>) -> String {
    let mut pieces = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| HIDDEN_TEXT_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }

    collapse_whitespace(&pieces.join(" "))
}
