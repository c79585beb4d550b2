use super::{non_blank, walk_xml, XmlStep};
use crate::{Result, ScrapeError};
use serde::Serialize;

/// One `<url>` (or `<sitemap>` in an index) entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// Parses a sitemap (`<urlset>`) or sitemap index (`<sitemapindex>`)
///
/// Entries without a `<loc>` are dropped. A priority that is not a number is treated
/// as absent.
///
/// # Example
///
/// ```
/// use pagesift::feeds::parse_sitemap;
///
/// let xml = r#"<urlset><url><loc>https://example.com/</loc><priority>0.8</priority></url></urlset>"#;
/// let entries = parse_sitemap(xml).unwrap();
/// assert_eq!(entries[0].loc, "https://example.com/");
/// assert_eq!(entries[0].priority, Some(0.8));
/// ```
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>> {
    let mut entries = Vec::new();
    let mut current: Option<SitemapEntry> = None;
    let mut root: Option<String> = None;
    let mut buffer = String::new();

    walk_xml(xml, "sitemap", |step| match step {
        XmlStep::Open(path) => {
            if path.len() == 1 {
                root = Some(path[0].clone());
            }
            if path.len() == 2 && is_entry(&path[1]) {
                current = Some(SitemapEntry::default());
            }
            buffer.clear();
        }
        XmlStep::Text(path, text) => {
            if path.len() == 3 {
                buffer.push_str(text);
            }
        }
        XmlStep::Close(path) => match path.len() {
            3 => {
                if let Some(entry) = current.as_mut() {
                    let value = std::mem::take(&mut buffer);
                    match path[2].as_str() {
                        "loc" => entry.loc = value.trim().to_string(),
                        "lastmod" => entry.lastmod = non_blank(value),
                        "changefreq" => entry.changefreq = non_blank(value),
                        "priority" => entry.priority = value.trim().parse().ok(),
                        _ => {}
                    }
                }
            }
            2 => {
                if let Some(entry) = current.take() {
                    if entry.loc.is_empty() {
                        tracing::debug!("Skipping sitemap entry without <loc>");
                    } else {
                        entries.push(entry);
                    }
                }
            }
            _ => {}
        },
    })?;

    match root.as_deref() {
        Some("urlset") | Some("sitemapindex") => Ok(entries),
        Some(other) => Err(ScrapeError::parse(
            "sitemap",
            format!("expected <urlset> root, found <{}>", other),
        )),
        None => Err(ScrapeError::parse("sitemap", "document has no root element")),
    }
}

fn is_entry(name: &str) -> bool {
    name == "url" || name == "sitemap"
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-01-15</lastmod>
    <changefreq>daily</changefreq>
    <priority>1.0</priority>
  </url>
  <url>
    <loc>https://example.com/about?a=1&amp;b=2</loc>
  </url>
  <url>
    <lastmod>2024-01-01</lastmod>
  </url>
</urlset>"#;

    #[test]
    fn test_parse_sitemap() {
        let entries = parse_sitemap(SITEMAP).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(
            entries[0],
            SitemapEntry {
                loc: "https://example.com/".into(),
                lastmod: Some("2024-01-15".into()),
                changefreq: Some("daily".into()),
                priority: Some(1.0),
            }
        );
        assert_eq!(entries[1].loc, "https://example.com/about?a=1&b=2");
        assert_eq!(entries[1].lastmod, None);
        assert_eq!(entries[1].priority, None);
    }

    #[test]
    fn test_sitemap_index() {
        let xml = "<sitemapindex><sitemap><loc>https://example.com/s1.xml</loc></sitemap></sitemapindex>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries[0].loc, "https://example.com/s1.xml");
    }

    #[test]
    fn test_empty_urlset() {
        assert!(parse_sitemap("<urlset/>").unwrap().is_empty());
    }

    #[test]
    fn test_bad_priority_is_absent() {
        let xml = "<urlset><url><loc>x</loc><priority>high</priority></url></urlset>";
        assert_eq!(parse_sitemap(xml).unwrap()[0].priority, None);
    }

    #[test]
    fn test_wrong_root() {
        let result = parse_sitemap("<html><body/></html>");
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));
    }

    #[test]
    fn test_malformed() {
        let result = parse_sitemap("<urlset><url><loc>x</url>");
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));
    }
}
