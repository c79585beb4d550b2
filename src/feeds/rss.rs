use super::{non_blank, walk_xml, XmlStep};
use crate::{Result, ScrapeError};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// One `<item>` of an RSS channel
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,

    /// Raw `<pubDate>` text
    #[serde(rename = "pubDate", skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,

    /// `<pubDate>` parsed as RFC 2822, when it is valid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<FixedOffset>>,
}

/// The parsed `<channel>` of an RSS document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RssChannel {
    pub title: String,
    pub items: Vec<RssItem>,
}

/// A feed discovered through a page's `<link type="application/rss+xml">`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RssFeed {
    /// Absolute feed URL
    pub url: String,
    pub title: String,
    pub items: Vec<RssItem>,
}

impl RssFeed {
    pub fn new(url: impl Into<String>, channel: RssChannel) -> Self {
        Self {
            url: url.into(),
            title: channel.title,
            items: channel.items,
        }
    }
}

/// Parses an RSS 2.0 document
///
/// Fails when the document is malformed or has no `<channel>`.
pub fn parse_rss(xml: &str) -> Result<RssChannel> {
    let mut channel: Option<RssChannel> = None;
    let mut item: Option<RssItem> = None;
    let mut buffer = String::new();

    walk_xml(xml, "rss", |step| match step {
        XmlStep::Open(path) => {
            buffer.clear();
            match path.len() {
                2 if path[1] == "channel" => channel = Some(RssChannel::default()),
                3 if path[2] == "item" => item = Some(RssItem::default()),
                _ => {}
            }
        }
        XmlStep::Text(_, text) => buffer.push_str(text),
        XmlStep::Close(path) => {
            let value = std::mem::take(&mut buffer);
            match path.len() {
                3 if path[2] == "title" => {
                    if let Some(channel) = channel.as_mut() {
                        channel.title = value.trim().to_string();
                    }
                }
                3 if path[2] == "item" => {
                    if let (Some(channel), Some(done)) = (channel.as_mut(), item.take()) {
                        channel.items.push(done);
                    }
                }
                4 if path[2] == "item" => {
                    if let Some(item) = item.as_mut() {
                        assign_item_field(item, &path[3], value);
                    }
                }
                _ => {}
            }
        }
    })?;

    channel.ok_or_else(|| ScrapeError::parse("rss", "document has no <channel>"))
}

fn assign_item_field(item: &mut RssItem, field: &str, value: String) {
    match field {
        "title" => item.title = value.trim().to_string(),
        "link" => item.link = value.trim().to_string(),
        "description" => item.description = value.trim().to_string(),
        "pubDate" => {
            item.pub_date = non_blank(value);
            item.published = item.pub_date.as_deref().and_then(|raw| {
                match DateTime::parse_from_rfc2822(raw) {
                    Ok(date) => Some(date),
                    Err(e) => {
                        tracing::debug!("Unparseable pubDate '{}': {}", raw, e);
                        None
                    }
                }
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <link>https://example.com/</link>
    <item>
      <title>First</title>
      <link>https://example.com/1</link>
      <description><![CDATA[<p>Hello &amp; welcome</p>]]></description>
      <pubDate>Tue, 10 Jun 2003 04:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://example.com/2</link>
      <description>Plain &amp; simple</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_channel() {
        let channel = parse_rss(FEED).unwrap();
        assert_eq!(channel.title, "Example News");
        assert_eq!(channel.items.len(), 2);

        let first = &channel.items[0];
        assert_eq!(first.title, "First");
        assert_eq!(first.link, "https://example.com/1");
        assert_eq!(first.description, "<p>Hello &amp; welcome</p>");
        assert_eq!(first.pub_date.as_deref(), Some("Tue, 10 Jun 2003 04:00:00 GMT"));

        let published = first.published.unwrap();
        assert_eq!(published.year(), 2003);
        assert_eq!(published.hour(), 4);

        let second = &channel.items[1];
        assert_eq!(second.description, "Plain & simple");
        assert_eq!(second.pub_date, None);
        assert_eq!(second.published, None);
    }

    #[test]
    fn test_invalid_pub_date_kept_raw() {
        let xml = "<rss><channel><title>t</title><item><pubDate>yesterday</pubDate></item></channel></rss>";
        let item = &parse_rss(xml).unwrap().items[0];
        assert_eq!(item.pub_date.as_deref(), Some("yesterday"));
        assert!(item.published.is_none());
    }

    #[test]
    fn test_missing_channel() {
        let result = parse_rss("<rss version=\"2.0\"></rss>");
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));
    }

    #[test]
    fn test_not_xml() {
        assert!(parse_rss("<rss><channel>").is_err());
    }
}
