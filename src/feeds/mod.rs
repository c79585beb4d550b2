//! XML feed parsers: sitemaps and RSS channels
//!
//! Both formats are read with a streaming `quick-xml` reader. Elements are matched on
//! their local names, so namespaced documents parse the same as plain ones.

mod rss;
mod sitemap;

pub use rss::{parse_rss, RssChannel, RssFeed, RssItem};
pub use sitemap::{parse_sitemap, SitemapEntry};

use crate::{Result, ScrapeError};
use quick_xml::events::Event;
use quick_xml::Reader;

/// A step of the document walk, carrying the open-element path (root first)
pub(crate) enum XmlStep<'a> {
    /// An element opened; the path ends with it
    Open(&'a [String]),
    /// Character data inside the element at the end of the path
    Text(&'a [String], &'a str),
    /// The element at the end of the path is about to close
    Close(&'a [String]),
}

/// Walks an XML document, reporting element boundaries and text by path
///
/// Malformed markup and elements left open at end of input are parse errors
/// attributed to `context`.
pub(crate) fn walk_xml(
    xml: &str,
    context: &str,
    mut visit: impl FnMut(XmlStep<'_>),
) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ScrapeError::parse(context, e))?;

        match event {
            Event::Start(start) => {
                path.push(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
                visit(XmlStep::Open(&path));
            }
            Event::Empty(start) => {
                path.push(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
                visit(XmlStep::Open(&path));
                visit(XmlStep::Close(&path));
                path.pop();
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| ScrapeError::parse(context, e))?;
                visit(XmlStep::Text(&path, &text));
            }
            Event::CData(data) => {
                let data = data.into_inner();
                visit(XmlStep::Text(&path, &String::from_utf8_lossy(&data)));
            }
            Event::End(_) => {
                visit(XmlStep::Close(&path));
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = path.last() {
        return Err(ScrapeError::parse(
            context,
            format!("unexpected end of document inside <{}>", open),
        ));
    }

    Ok(())
}

/// Trims text content, treating blank values as absent
pub(crate) fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
