//! Parsers for data files fetched alongside pages: CSV, JSON and generic XML

use crate::{Result, ScrapeError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeMap;

/// A CSV row keyed by header; cells missing from a short row are `None`
pub type CsvRecord = BTreeMap<String, Option<String>>;

/// Parses CSV into raw rows
///
/// Rows may have differing lengths. Blank lines are skipped.
pub fn parse_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Parses CSV whose first row names the columns
///
/// Short rows are padded with `None`; cells beyond the last header are dropped.
///
/// ```
/// use pagesift::formats::parse_csv_records;
///
/// let records = parse_csv_records("name,age\nAda,36\nGrace").unwrap();
/// assert_eq!(records[0]["age"].as_deref(), Some("36"));
/// assert_eq!(records[1]["age"], None);
/// ```
pub fn parse_csv_records(content: &str) -> Result<Vec<CsvRecord>> {
    let mut rows = parse_csv(content)?.into_iter();
    let Some(headers) = rows.next() else {
        return Ok(Vec::new());
    };

    Ok(rows
        .map(|row| {
            let mut cells = row.into_iter();
            headers
                .iter()
                .map(|header| (header.clone(), cells.next()))
                .collect()
        })
        .collect())
}

/// Decodes JSON, treating invalid input and `null` as an empty object
pub fn parse_json(content: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(serde_json::Value::Null) => serde_json::Value::Object(serde_json::Map::new()),
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Content is not JSON: {}", e);
            serde_json::Value::Object(serde_json::Map::new())
        }
    }
}

/// An element of a parsed XML document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Concatenated character data directly inside this element
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ScrapeError::parse("xml", e))?;
            let value = attr
                .unescape_value()
                .map_err(|e| ScrapeError::parse("xml", e))?;
            attributes.insert(
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            );
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }
}

/// Parses an XML document into an element tree
pub fn parse_xml(xml: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    let mut attach = |element: XmlElement, stack: &mut Vec<XmlElement>| -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => root = Some(element),
            None => return Err(ScrapeError::parse("xml", "multiple root elements")),
        }
        Ok(())
    };

    loop {
        match reader
            .read_event()
            .map_err(|e| ScrapeError::parse("xml", e))?
        {
            Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
            Event::Empty(start) => attach(XmlElement::from_start(&start)?, &mut stack)?,
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| ScrapeError::parse("xml", e))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(element, &mut stack)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ScrapeError::parse(
            "xml",
            format!("unexpected end of document inside <{}>", open.name),
        ));
    }

    drop(attach);
    root.ok_or_else(|| ScrapeError::parse("xml", "document has no root element"))
}
